//! Command assembly: template plus live user edits into an execution request.
//!
//! # Design
//! - The input flag always comes from the template; option strings are tokenised,
//!   never validated. Malformed options surface as engine failures.
//! - `CommandDraft` owns the selection rules: switching templates discards edits,
//!   re-selecting the active template only keeps the output file name.

use ffonline_config::{PipelineSettings, Template};

/// User edits applied on top of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOverrides {
    /// Replacement for the role-2 option string.
    pub output_options: Option<String>,
    /// Replacement for the role-3 output file name.
    pub output_filename: Option<String>,
    /// Replacement for the role-1 input file name.
    pub input_filename: Option<String>,
}

/// Concrete argument lists for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Arguments before the input file name.
    pub input_args: Vec<String>,
    /// Input file name.
    pub input_filename: String,
    /// Arguments between the input and output file names.
    pub output_args: Vec<String>,
    /// Output file name.
    pub output_filename: String,
}

impl ExecutionRequest {
    /// Ordered engine arguments: `input_args ++ [input] ++ output_args ++ [output]`.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args =
            Vec::with_capacity(self.input_args.len() + self.output_args.len() + 2);
        args.extend(self.input_args.iter().cloned());
        args.push(self.input_filename.clone());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output_filename.clone());
        args
    }

    /// Display form of the command, quoting arguments that need it.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once("ffmpeg".to_string())
            .chain(self.args().iter().map(|arg| display_arg(arg)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the execution request for `template` with `overrides` applied.
#[must_use]
pub fn assemble(template: &Template, overrides: &CommandOverrides) -> ExecutionRequest {
    let options = overrides
        .output_options
        .as_deref()
        .unwrap_or_else(|| template.output_options());

    ExecutionRequest {
        input_args: tokenize_options(template.input_flag()),
        input_filename: overrides
            .input_filename
            .clone()
            .unwrap_or_else(|| template.input_filename().to_string()),
        output_args: tokenize_options(options),
        output_filename: overrides
            .output_filename
            .clone()
            .unwrap_or_else(|| template.output_filename().to_string()),
    }
}

/// Split an option string into arguments.
///
/// Whitespace separates arguments; single or double quotes group text into one
/// argument and are removed. An unterminated quote runs to the end of the input.
#[must_use]
pub fn tokenize_options(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in raw.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

fn display_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

/// Stateful template selection with the edit-reset rules applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDraft {
    template: Template,
    overrides: CommandOverrides,
}

impl CommandDraft {
    /// Start a draft with `template` selected.
    #[must_use]
    pub fn new(template: &Template, settings: &PipelineSettings) -> Self {
        Self {
            template: template.clone(),
            overrides: fresh_overrides(template, settings),
        }
    }

    /// Select `template`. Switching to a different template resets the input
    /// file name to the category default and discards option and output edits.
    /// Re-selecting the active template restores its option string and keeps
    /// the input and output file names.
    pub fn select(&mut self, template: &Template, settings: &PipelineSettings) {
        if template.key == self.template.key {
            self.overrides.output_options = None;
            return;
        }
        self.template = template.clone();
        self.overrides = fresh_overrides(template, settings);
    }

    /// Replace the option string.
    pub fn edit_output_options(&mut self, options: impl Into<String>) {
        self.overrides.output_options = Some(options.into());
    }

    /// Replace the output file name.
    pub fn edit_output_filename(&mut self, filename: impl Into<String>) {
        self.overrides.output_filename = Some(filename.into());
    }

    /// Replace the input file name, e.g. after a file was uploaded.
    pub fn set_input_filename(&mut self, filename: impl Into<String>) {
        self.overrides.input_filename = Some(filename.into());
    }

    /// Active template.
    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    /// Current overrides.
    #[must_use]
    pub const fn overrides(&self) -> &CommandOverrides {
        &self.overrides
    }

    /// Option string currently in effect.
    #[must_use]
    pub fn output_options(&self) -> &str {
        self.overrides
            .output_options
            .as_deref()
            .unwrap_or_else(|| self.template.output_options())
    }

    /// Assemble the request for the current selection.
    #[must_use]
    pub fn request(&self) -> ExecutionRequest {
        assemble(&self.template, &self.overrides)
    }
}

fn fresh_overrides(template: &Template, settings: &PipelineSettings) -> CommandOverrides {
    CommandOverrides {
        input_filename: Some(settings.default_input_name(template.category).to_string()),
        ..CommandOverrides::default()
    }
}
