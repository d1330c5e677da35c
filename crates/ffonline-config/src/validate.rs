//! Load-time validation of raw template definitions.

use crate::error::{CatalogError, CatalogResult};
use crate::model::{SegmentRole, Template, TemplateDefinition};

/// Validate a raw definition and convert it into an immutable [`Template`].
///
/// # Errors
///
/// Returns an error when the key is empty, the segment count is not four, a
/// segment's `copyable` flag disagrees with its role, or a non-editable
/// segment other than the option string is empty.
pub fn validate_definition(definition: TemplateDefinition) -> CatalogResult<Template> {
    let TemplateDefinition {
        key,
        title,
        category,
        segments,
        warning,
    } = definition;

    if key.trim().is_empty() {
        return Err(CatalogError::EmptyKey);
    }

    let found = segments.len();
    let segments: [_; 4] = segments.try_into().map_err(|_| CatalogError::Arity {
        key: key.clone(),
        found,
    })?;

    for role in SegmentRole::ALL {
        let segment = &segments[role.index()];
        if segment.copyable != role.copyable() {
            return Err(CatalogError::SegmentRole {
                key,
                role,
                reason: if role.copyable() {
                    "option string must be copyable"
                } else {
                    "only the option string may be copyable"
                },
            });
        }
        if role != SegmentRole::OutputOptions && segment.text.trim().is_empty() {
            return Err(CatalogError::SegmentRole {
                key,
                role,
                reason: "segment text must not be empty",
            });
        }
    }

    let title = title.unwrap_or_else(|| key.clone());
    let warning = warning.filter(|text| !text.trim().is_empty());

    Ok(Template {
        key,
        title,
        category,
        segments,
        warning,
    })
}
