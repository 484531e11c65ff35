//! # subcmd: declarative subcommand framework
//!
//! Declare commands, typed options, preconditions and handlers once; at run
//! time the framework classifies the raw argument list, selects the
//! subcommand, binds options to typed values, checks preconditions and calls
//! the handler.
//!
//! ## Core Principles
//!
//! - **Collected declaration errors**: every definition mistake is reported at start-up, not just the first
//! - **Typed options**: `flag`, `int`, `float`, `string` and `date`, inferred from defaults
//! - **Accumulated parse errors**: one bad token never hides the next one
//! - **Nested dispatch**: handlers can run other commands and get their own state back afterwards
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subcmd::{AppBuilder, AppConfig, Nested, OptionSpec};
//!
//! let mut builder = AppBuilder::new("Sample app", AppConfig::default().version("0.0.1").help(true));
//!
//! builder.command("list", "Lists all items", |c| {
//!     c.option("sorted", "Sorts the listed items by name", OptionSpec::new().short('s'));
//!     c.check("This command expects no arguments", |inv| inv.args().is_empty());
//!     c.run(|inv| {
//!         println!("listing (sorted: {})", inv.flag("sorted"));
//!         Ok(())
//!     });
//! });
//!
//! builder.command("refresh", "Refreshes, then lists", |c| {
//!     c.run(|inv| {
//!         println!("refreshing {:?}", inv.args());
//!         inv.run_command("list", Nested::new().args(Vec::<String>::new()))
//!     });
//! });
//!
//! let app = builder.build();
//! app.run_and_exit(std::env::args().skip(1));
//! ```

// Optional modules
pub mod tracing_support;

pub mod app;
pub mod command;
pub mod error;
pub mod help;
pub mod invocation;
pub mod option;
pub mod token;
pub mod value;

pub use app::{App, AppBuilder, AppConfig, CommandBuilder, HELP_OPTION};
pub use command::{Command, Handler, Precondition, Predicate};
pub use error::{DeclarationError, FrameworkError, ParseError};
pub use help::{Halt, HaltReason};
pub use invocation::{Invocation, Nested, Outcome, Status};
pub use option::{OptionDef, OptionSpec};
pub use token::Token;
pub use value::{IntoValue, OptionType, Opts, Value};

// Re-export tracing itself so hosts can log with the same macros
pub use tracing_support::tracing;

#[cfg(feature = "tracing")]
pub use tracing_support::{init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat};

// ============================================================================
// Core Types
// ============================================================================

/// CLI result type.
///
/// Handlers return `CliResult<()>`; so do nested dispatches, which makes `?`
/// the natural way to propagate a failed nested command.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Error Types
// ============================================================================

/// Top-level error type for a run.
///
/// Distinguishes a stopped check phase (exit code 0 or 1), user-fixable
/// errors raised by handlers (exit code 1) and framework failures (exit code 101).
#[derive(Debug)]
pub enum CliError {
    /// The check phase stopped the run before its handler.
    Halt(Halt),

    /// User-fixable errors (exit code 1).
    ///
    /// These should include actionable hints for users.
    User(UserError),

    /// Framework failures (exit code 101).
    ///
    /// Broken declarations or misuse of the invocation state machine.
    System(SystemError),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Halt(halt) => halt.exit_code(),
            CliError::User(_) => 1,
            CliError::System(_) => 101,
        }
    }

    /// Convenience constructor for user errors.
    pub fn user(message: impl Into<String>) -> Self {
        CliError::User(UserError::Generic(message.into()))
    }

    /// A positional argument the handler cannot work with.
    pub fn invalid_argument(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        CliError::User(UserError::InvalidArgument {
            arg: arg.into(),
            reason: reason.into(),
        })
    }

    /// Convenience constructor for system errors.
    pub fn system(message: impl Into<String>) -> Self {
        CliError::System(SystemError::Internal(message.into()))
    }

    /// The halt record, if the check phase stopped the run.
    pub fn as_halt(&self) -> Option<&Halt> {
        match self {
            CliError::Halt(halt) => Some(halt),
            _ => None,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Halt(halt) => write!(f, "{}", halt),
            CliError::User(e) => write!(f, "{}", e),
            CliError::System(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

/// User-fixable errors (exit code 1).
#[derive(Debug)]
pub enum UserError {
    /// Generic user error with a message.
    Generic(String),

    /// Invalid argument provided.
    InvalidArgument { arg: String, reason: String },
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::Generic(msg) => write!(f, "Error: {}", msg),
            UserError::InvalidArgument { arg, reason } => {
                write!(f, "Error: Invalid argument '{}'\n\n{}", arg, reason)
            }
        }
    }
}

/// Framework failures (exit code 101).
#[derive(Debug)]
pub enum SystemError {
    /// Generic internal error.
    Internal(String),

    /// I/O error.
    Io(std::io::Error),

    /// Invalid declarations or a broken invocation invariant.
    Framework(FrameworkError),
}

impl std::fmt::Display for SystemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemError::Internal(msg) => {
                write!(f, "Internal Error: {}\n\nThis is likely a bug.", msg)
            }
            SystemError::Io(e) => {
                write!(f, "Internal Error: I/O operation failed\n\n{:?}", e)
            }
            SystemError::Framework(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::System(SystemError::Io(e))
    }
}

impl From<FrameworkError> for CliError {
    fn from(e: FrameworkError) -> Self {
        CliError::System(SystemError::Framework(e))
    }
}

impl From<Halt> for CliError {
    fn from(halt: Halt) -> Self {
        CliError::Halt(halt)
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Exit code and text produced for a finished run.
pub struct Response {
    /// Exit code (0 = success or help, 1 = user error, 101 = system error).
    pub exit_code: i32,

    /// Output to display.
    pub output: Output,
}

impl Response {
    /// Create a successful silent response.
    pub fn silent() -> Self {
        Self {
            exit_code: 0,
            output: Output::Silent,
        }
    }

    /// Create a successful response with text output.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            output: Output::Text(content.into()),
        }
    }

    /// Create an error response.
    pub fn error(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: Output::Text(message.into()),
        }
    }

    /// Print the output: stdout on exit code 0, stderr otherwise.
    pub fn print(&self) {
        if self.output.is_empty() {
            return;
        }
        if self.exit_code == 0 {
            println!("{}", self.output);
        } else {
            eprintln!("{}", self.output);
        }
    }
}

/// Output type for responses.
#[derive(Debug)]
pub enum Output {
    /// No output.
    Silent,

    /// Text output.
    Text(String),
}

impl Output {
    /// Check if output is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Silent)
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Silent => Ok(()),
            Output::Text(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_exit_code() {
        let err = CliError::user("test error");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Error: test error");
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = CliError::invalid_argument("pear", "No such item");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Error: Invalid argument 'pear'\n\nNo such item");
    }

    #[test]
    fn test_system_error_exit_code() {
        let err = CliError::system("test error");
        assert_eq!(err.exit_code(), 101);
    }

    #[test]
    fn test_framework_error_is_system_error() {
        let err: CliError = FrameworkError::StackUnderflow.into();
        assert_eq!(err.exit_code(), 101);
        assert_eq!(err.to_string(), "Internal invocation stack empty");
    }

    #[test]
    fn test_halt_exit_codes() {
        let help: CliError = Halt::new(HaltReason::HelpRequested, None, Vec::new()).into();
        assert_eq!(help.exit_code(), 0);

        let failed: CliError =
            Halt::new(HaltReason::Errors, Some("list"), vec!["No command given".into()]).into();
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(failed.as_halt().and_then(Halt::last_error), Some("No command given"));
    }

    #[test]
    fn test_silent_response() {
        let response = Response::silent();
        assert_eq!(response.exit_code, 0);
        assert!(response.output.is_empty());
    }

    #[test]
    fn test_text_response() {
        let response = Response::text("done");
        assert_eq!(response.exit_code, 0);
        assert_eq!(response.output.to_string(), "done");
    }
}
