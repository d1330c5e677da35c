//! Template catalog: the built-in command blueprints plus custom catalog loading.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{Category, Segment, SegmentRole, Template, TemplateDefinition};
use crate::validate::validate_definition;

/// Key of the template used when a lookup misses.
pub const DEFAULT_TEMPLATE_KEY: &str = "default";

const H265_WARNING: &str = "Videos encoded with H.265 (libx265) will not play in most web \
                            browsers (such as Chrome or Firefox) and show a black screen.";

/// Templates listed under one menu category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateGroup<'a> {
    /// Menu category.
    pub category: Category,
    /// Templates in catalog order.
    pub templates: Vec<&'a Template>,
}

/// Ordered, immutable set of templates with a guaranteed default entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Catalog shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        let templates = vec![
            builtin_template(
                DEFAULT_TEMPLATE_KEY,
                "Default command",
                Category::Uncategorized,
                ("input.mp4", "", "output.mp4"),
                None,
            ),
            builtin_template(
                "img_to_webp",
                "Convert PNG/JPG to WebP",
                Category::Image,
                ("image.png", "", "output.webp"),
                None,
            ),
            builtin_template(
                "vid_compress_h264_medium",
                "Compress MP4, medium (H.264)",
                Category::Video,
                (
                    "input.mp4",
                    "-c:v libx264 -crf 28 -preset medium -movflags +faststart -c:a aac -b:a 128k",
                    "output.mp4",
                ),
                None,
            ),
            builtin_template(
                "vid_compress_h264_max",
                "Compress MP4, maximum (web)",
                Category::Video,
                (
                    "input.mp4",
                    "-c:v libx264 -crf 30 -preset medium -movflags +faststart -c:a aac -b:a 128k",
                    "output.mp4",
                ),
                None,
            ),
            builtin_template(
                "vid_to_gif",
                "High quality GIF",
                Category::Video,
                (
                    "input.mp4",
                    "-vf \"fps=10,scale=540:-1:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse\"",
                    "output.gif",
                ),
                None,
            ),
            builtin_template(
                "vid_compress_h265",
                "Compress MP4, medium (H.265)",
                Category::Video,
                (
                    "input.mp4",
                    "-vcodec libx265 -acodec aac -crf 28",
                    "output.mp4",
                ),
                Some(H265_WARNING),
            ),
        ];
        Self { templates }
    }

    /// Load a catalog from a JSON array of template definitions.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is malformed, a definition fails
    /// validation, keys collide, or no `default` template is present.
    pub fn from_json(raw: &str) -> CatalogResult<Self> {
        let definitions: Vec<TemplateDefinition> =
            serde_json::from_str(raw).map_err(|source| CatalogError::Parse { source })?;
        Self::from_definitions(definitions)
    }

    /// Build a catalog from raw definitions, validating each one.
    ///
    /// # Errors
    ///
    /// See [`TemplateCatalog::from_json`].
    pub fn from_definitions(definitions: Vec<TemplateDefinition>) -> CatalogResult<Self> {
        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let template = validate_definition(definition)?;
            if !seen.insert(template.key.clone()) {
                return Err(CatalogError::DuplicateKey { key: template.key });
            }
            templates.push(template);
        }

        if !seen.contains(DEFAULT_TEMPLATE_KEY) {
            return Err(CatalogError::MissingDefault);
        }

        debug!(templates = templates.len(), "template catalog loaded");
        Ok(Self { templates })
    }

    /// Look up a template by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.key == key)
    }

    /// Look up a template by key, falling back to the default template.
    #[must_use]
    pub fn get_or_default(&self, key: &str) -> &Template {
        self.get(key)
            .or_else(|| self.get(DEFAULT_TEMPLATE_KEY))
            .unwrap_or_else(|| &self.templates[0])
    }

    /// The default template.
    #[must_use]
    pub fn default_template(&self) -> &Template {
        self.get_or_default(DEFAULT_TEMPLATE_KEY)
    }

    /// Templates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Number of templates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always `false`; a catalog holds at least the default template.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates grouped for the selection menu: video, image, then the rest.
    /// Empty groups are omitted.
    #[must_use]
    pub fn grouped(&self) -> Vec<TemplateGroup<'_>> {
        Category::MENU_ORDER
            .into_iter()
            .map(|category| TemplateGroup {
                category,
                templates: self
                    .templates
                    .iter()
                    .filter(|template| template.category == category)
                    .collect(),
            })
            .filter(|group| !group.templates.is_empty())
            .collect()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_template(
    key: &str,
    title: &str,
    category: Category,
    (input, options, output): (&str, &str, &str),
    warning: Option<&str>,
) -> Template {
    Template {
        key: key.to_string(),
        title: title.to_string(),
        category,
        segments: [
            Segment::for_role(SegmentRole::InputFlag, "-i", "Input flag"),
            Segment::for_role(SegmentRole::InputFile, input, "Input file"),
            Segment::for_role(SegmentRole::OutputOptions, options, "Options"),
            Segment::for_role(SegmentRole::OutputFile, output, "Output file"),
        ],
        warning: warning.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_pass_validation() -> CatalogResult<()> {
        let catalog = TemplateCatalog::builtin();
        let definitions = catalog
            .iter()
            .map(|template| TemplateDefinition {
                key: template.key.clone(),
                title: Some(template.title.clone()),
                category: template.category,
                segments: template.segments.to_vec(),
                warning: template.warning.clone(),
            })
            .collect();
        let reloaded = TemplateCatalog::from_definitions(definitions)?;
        assert_eq!(reloaded, catalog);
        assert_eq!(catalog.len(), 6);
        Ok(())
    }

    #[test]
    fn unknown_key_falls_back_to_default() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.get_or_default("nope").key, DEFAULT_TEMPLATE_KEY);
        assert_eq!(catalog.get_or_default("vid_to_gif").output_filename(), "output.gif");
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn grouping_follows_menu_order() {
        let catalog = TemplateCatalog::builtin();
        let groups = catalog.grouped();
        let categories: Vec<_> = groups.iter().map(|group| group.category).collect();
        assert_eq!(
            categories,
            vec![Category::Video, Category::Image, Category::Uncategorized]
        );
        let video_keys: Vec<_> = groups[0]
            .templates
            .iter()
            .map(|template| template.key.as_str())
            .collect();
        assert_eq!(
            video_keys,
            vec![
                "vid_compress_h264_medium",
                "vid_compress_h264_max",
                "vid_to_gif",
                "vid_compress_h265"
            ]
        );
    }

    #[test]
    fn only_h265_carries_a_warning() {
        let catalog = TemplateCatalog::builtin();
        let warned: Vec<_> = catalog
            .iter()
            .filter(|template| template.warning.is_some())
            .map(|template| template.key.as_str())
            .collect();
        assert_eq!(warned, vec!["vid_compress_h265"]);
    }

    #[test]
    fn custom_catalog_requires_default() {
        let raw = r#"[{
            "key": "only",
            "segments": [
                {"text": "-i"},
                {"text": "a.mp4"},
                {"text": "", "copyable": true},
                {"text": "b.mp4"}
            ]
        }]"#;
        assert!(matches!(
            TemplateCatalog::from_json(raw),
            Err(CatalogError::MissingDefault)
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let entry = r#"{
            "key": "default",
            "segments": [
                {"text": "-i"},
                {"text": "a.mp4"},
                {"text": "", "copyable": true},
                {"text": "b.mp4"}
            ]
        }"#;
        let raw = format!("[{entry},{entry}]");
        assert!(matches!(
            TemplateCatalog::from_json(&raw),
            Err(CatalogError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            TemplateCatalog::from_json("{"),
            Err(CatalogError::Parse { .. })
        ));
    }
}
