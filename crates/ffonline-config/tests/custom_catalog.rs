use std::error::Error;

use ffonline_config::{Category, DEFAULT_TEMPLATE_KEY, SegmentRole, TemplateCatalog};

type TestResult<T> = Result<T, Box<dyn Error>>;

const CATALOG: &str = r#"[
    {
        "key": "default",
        "title": "Plain copy",
        "segments": [
            {"text": "-i", "description": "flag"},
            {"text": "input.mp4", "description": "input"},
            {"text": "-c copy", "description": "options", "copyable": true},
            {"text": "copy.mp4", "description": "output"}
        ]
    },
    {
        "key": "thumb",
        "title": "Thumbnail",
        "category": "image",
        "segments": [
            {"text": "-i"},
            {"text": "image.png"},
            {"text": "-vf scale=128:-1", "copyable": true},
            {"text": "thumb.jpg"}
        ],
        "warning": "Upscaling is not performed."
    }
]"#;

#[test]
fn custom_catalog_round_trips_through_lookup() -> TestResult<()> {
    let catalog = TemplateCatalog::from_json(CATALOG)?;
    assert_eq!(catalog.len(), 2);

    let thumb = catalog.get_or_default("thumb");
    assert_eq!(thumb.category, Category::Image);
    assert_eq!(thumb.output_options(), "-vf scale=128:-1");
    assert!(thumb.segment(SegmentRole::OutputOptions).copyable);
    assert_eq!(thumb.warning.as_deref(), Some("Upscaling is not performed."));

    let fallback = catalog.get_or_default("missing");
    assert_eq!(fallback.key, DEFAULT_TEMPLATE_KEY);
    assert_eq!(fallback.output_filename(), "copy.mp4");

    let groups = catalog.grouped();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].category, Category::Image);
    assert_eq!(groups[1].category, Category::Uncategorized);
    Ok(())
}
