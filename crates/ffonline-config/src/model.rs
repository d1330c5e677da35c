//! Typed template records.
//!
//! # Design
//! - A template is a fixed-arity, four-segment command blueprint; roles are positional.
//! - `TemplateDefinition` is the loosely-typed wire form; it only becomes a
//!   `Template` after passing [`crate::validate_definition`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Menu category a template is listed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Video conversion and compression commands.
    Video,
    /// Still image conversion commands.
    Image,
    /// Commands outside either menu group.
    #[default]
    Uncategorized,
}

impl Category {
    /// Menu order used when grouping templates.
    pub const MENU_ORDER: [Self; 3] = [Self::Video, Self::Image, Self::Uncategorized];

    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Uncategorized => "uncategorized",
        }
    }
}

/// Positional role of a segment within a template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRole {
    /// Engine input flag, e.g. `-i`.
    InputFlag,
    /// Input file name.
    InputFile,
    /// User-editable output option string.
    OutputOptions,
    /// Output file name.
    OutputFile,
}

impl SegmentRole {
    /// Roles in segment order.
    pub const ALL: [Self; 4] = [
        Self::InputFlag,
        Self::InputFile,
        Self::OutputOptions,
        Self::OutputFile,
    ];

    /// Position of the role in a template's segment list.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::InputFlag => 0,
            Self::InputFile => 1,
            Self::OutputOptions => 2,
            Self::OutputFile => 3,
        }
    }

    /// Only the option string may be copied and overridden by the user.
    #[must_use]
    pub const fn copyable(self) -> bool {
        matches!(self, Self::OutputOptions)
    }

    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputFlag => "input_flag",
            Self::InputFile => "input_file",
            Self::OutputOptions => "output_options",
            Self::OutputFile => "output_file",
        }
    }
}

impl fmt::Display for SegmentRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One argument segment of a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// Literal argument text.
    pub text: String,
    /// Human description shown next to the segment.
    #[serde(default)]
    pub description: String,
    /// Whether the user may copy and edit the segment.
    #[serde(default)]
    pub copyable: bool,
}

impl Segment {
    /// Construct a segment for `role`, deriving `copyable` from the role.
    #[must_use]
    pub fn for_role(role: SegmentRole, text: &str, description: &str) -> Self {
        Self {
            text: text.to_string(),
            description: description.to_string(),
            copyable: role.copyable(),
        }
    }
}

/// Immutable, validated command blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Unique key.
    pub key: String,
    /// Menu title.
    pub title: String,
    /// Menu category.
    pub category: Category,
    /// Segments in role order.
    pub segments: [Segment; 4],
    /// Optional caution shown while the template is active.
    pub warning: Option<String>,
}

impl Template {
    /// Segment for the given role.
    #[must_use]
    pub const fn segment(&self, role: SegmentRole) -> &Segment {
        &self.segments[role.index()]
    }

    /// Role-0 text.
    #[must_use]
    pub fn input_flag(&self) -> &str {
        &self.segment(SegmentRole::InputFlag).text
    }

    /// Role-1 text.
    #[must_use]
    pub fn input_filename(&self) -> &str {
        &self.segment(SegmentRole::InputFile).text
    }

    /// Role-2 text.
    #[must_use]
    pub fn output_options(&self) -> &str {
        &self.segment(SegmentRole::OutputOptions).text
    }

    /// Role-3 text.
    #[must_use]
    pub fn output_filename(&self) -> &str {
        &self.segment(SegmentRole::OutputFile).text
    }
}

/// Raw template as read from a catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateDefinition {
    /// Unique key.
    pub key: String,
    /// Menu title; defaults to the key.
    #[serde(default)]
    pub title: Option<String>,
    /// Menu category.
    #[serde(default)]
    pub category: Category,
    /// Segments in role order.
    pub segments: Vec<Segment>,
    /// Optional caution.
    #[serde(default)]
    pub warning: Option<String>,
}
