//! Error domains.
//!
//! Declaration errors are collected by the builders and surface together when
//! the app is started. Parse errors are accumulated by an [`Invocation`]
//! while it scans the argument list. Framework errors signal broken
//! invariants of the dispatcher itself and are never recovered.
//!
//! [`Invocation`]: crate::Invocation

use thiserror::Error;

/// Mistakes in the command and option declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("Duplicate command '{0}'")]
    DuplicateCommand(String),

    #[error("Command '{0}' has no run block.")]
    MissingHandler(String),

    #[error("Command '{0}' can't have two run blocks")]
    DuplicateHandler(String),

    #[error("Missing check code block")]
    MissingPredicate,

    #[error("Duplicate option key '{0}'")]
    DuplicateOptionKey(String),

    #[error("Unsupported argument type '{0}'")]
    UnsupportedType(String),

    #[error("Conflict between type of default value and explicit type for option '{0}'")]
    TypeConflict(String),

    #[error("Short option names must consist of a single letter only ('{0}').")]
    InvalidShort(String),

    #[error("Long option names must consist of at least two letters ('{0}').")]
    InvalidLong(String),
}

/// Problems found in the raw argument list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unknown option, or a token with three or more leading dashes.
    #[error("Invalid option '{0}'")]
    InvalidOption(String),

    /// `--no-<name>` where `<name>` is not a flag.
    #[error("Invalid option '--no-{0}'")]
    InvalidNegation(String),

    /// A non-flag short option inside a `-abc` cluster.
    #[error("Cannot accept option '{0}' without an argument")]
    ClusteredValue(char),

    #[error("Option '{0}' expects a value")]
    MissingValue(String),

    #[error("Option '{0}' expects true or false")]
    ExpectedFlag(String),

    #[error("Option '{0}' expects an integer")]
    ExpectedInt(String),

    #[error("Option '{0}' expects a float number")]
    ExpectedFloat(String),

    #[error("Option '{0}' expects a date")]
    ExpectedDate(String),
}

/// Internal consistency violations of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameworkError {
    #[error("Fatal: There are command and option definition errors:{}", bullet_list(.0))]
    InvalidDeclarations(Vec<String>),

    #[error("App cannot be run more than once")]
    AlreadyRun,

    #[error("Cannot invoke commands if app is not running")]
    NotRunning,

    #[error("Unknown command name '{0}'")]
    UnknownCommand(String),

    #[error("Internal invocation stack empty")]
    StackUnderflow,

    #[error("Command '{0}' cannot be executed")]
    NotExecutable(String),
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|item| format!("\n - {}", item)).collect()
}
