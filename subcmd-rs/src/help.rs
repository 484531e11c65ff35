//! Halting the check phase and presenting the result.
//!
//! The dispatcher only decides *that* a run stops before its handler; this
//! module holds the stop record and renders the text printed for it. Only
//! the most recent error is shown.

use std::fmt;

use anstyle::{AnsiColor, Style};

use crate::app::App;
use crate::option::OptionDef;

/// Why the check phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The built-in help flag was given.
    HelpRequested,
    /// Parse errors, no command, or a failed precondition.
    Errors,
}

/// A run stopped in its check phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    reason: HaltReason,
    command: Option<String>,
    errors: Vec<String>,
}

impl Halt {
    pub fn new(reason: HaltReason, command: Option<&str>, errors: Vec<String>) -> Self {
        Self {
            reason,
            command: command.map(str::to_string),
            errors,
        }
    }

    pub fn reason(&self) -> HaltReason {
        self.reason
    }

    pub fn is_help(&self) -> bool {
        self.reason == HaltReason::HelpRequested
    }

    /// The command active when the run stopped.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Every recorded error, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(String::as_str)
    }

    /// 0 for a help request, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.reason {
            HaltReason::HelpRequested => 0,
            HaltReason::Errors => 1,
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.last_error()) {
            (HaltReason::HelpRequested, _) => f.write_str("Help requested"),
            (HaltReason::Errors, Some(error)) => f.write_str(error),
            (HaltReason::Errors, None) => f.write_str("Execution halted"),
        }
    }
}

/// Render the help text for `halt`: the last error, then the app and
/// command descriptions.
pub fn render(app: &App, halt: &Halt, styled: bool) -> String {
    let error_style = if styled {
        Style::new().bold().fg_color(Some(AnsiColor::Red.into()))
    } else {
        Style::new()
    };
    let heading = if styled { Style::new().bold() } else { Style::new() };

    let mut lines = Vec::new();
    if !halt.is_help() {
        if let Some(error) = halt.last_error() {
            lines.push(format!("{error_style}{error}{error_style:#}"));
            lines.push(String::new());
        }
    }

    let title = match app.version() {
        Some(version) => format!("{} {}", app.description(), version),
        None => app.description().to_string(),
    };
    lines.push(format!("{heading}{title}{heading:#}"));

    match halt.command().and_then(|name| app.command(name)) {
        Some(command) => {
            lines.push(format!(
                "{}: {}",
                command.name().unwrap_or_default(),
                command.description()
            ));
            for option in command.options().iter().chain(app.global_options()) {
                lines.push(option_line(option));
            }
        }
        None => {
            for command in app.commands() {
                lines.push(format!(
                    "  {}: {}",
                    command.name().unwrap_or_default(),
                    command.description()
                ));
            }
        }
    }

    lines.join("\n")
}

fn option_line(option: &OptionDef) -> String {
    let mut spelling = format!("--{}", option.long().replace('_', "-"));
    if let Some(short) = option.short() {
        spelling.push_str(&format!(", -{}", short));
    }
    if !option.is_flag() {
        spelling.push_str(&format!(" <{}>", option.kind()));
    }
    format!("    {:<24} {}", spelling, option.description())
}
