//! Application registry and declaration builders.
//!
//! Declarations never fail on the spot: every mistake is recorded and the
//! whole list is reported when the app is started, so one pass surfaces
//! every definition error.
//!
//! # Example
//!
//! ```
//! use subcmd::{AppBuilder, AppConfig, OptionSpec};
//!
//! let mut builder = AppBuilder::new("Sample app", AppConfig::default().version("0.0.1"));
//! builder.command("show", "Shows the requested item", |c| {
//!     c.option("pager", "Shows item contents in a pager", OptionSpec::new().short('p'));
//!     c.run(|inv| {
//!         println!("showing {:?}", inv.args());
//!         Ok(())
//!     });
//! });
//! let app = builder.build();
//!
//! let outcome = app.run(["show", "-p", "item"]).unwrap();
//! assert_eq!(outcome.command.as_deref(), Some("show"));
//! assert_eq!(outcome.args, ["item"]);
//! ```

use std::collections::BTreeMap;
use std::io::IsTerminal;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::Command;
use crate::error::{DeclarationError, FrameworkError};
use crate::help;
use crate::invocation::{Invocation, Outcome};
use crate::option::{OptionDef, OptionSpec};
use crate::{CliError, CliResult, Output, Response};

/// Name of the built-in help flag.
pub const HELP_OPTION: &str = "help";

/// App-wide settings given at declaration time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version shown in help output.
    #[serde(default)]
    pub version: Option<String>,

    /// Register a global `--help`/`-h` flag.
    #[serde(default)]
    pub help: bool,

    /// Host-specific settings.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AppConfig {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn help(mut self, help: bool) -> Self {
        self.help = help;
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}

/// Registered commands, the global command and any declaration errors.
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    global: Command,
    commands: BTreeMap<String, Command>,
    errors: Vec<String>,
}

impl App {
    pub fn builder(description: impl Into<String>, config: AppConfig) -> AppBuilder {
        AppBuilder::new(description, config)
    }

    pub fn description(&self) -> &str {
        self.global.description()
    }

    pub fn version(&self) -> Option<&str> {
        self.config.version.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The unnamed command holding options shared by every subcommand.
    pub fn global(&self) -> &Command {
        &self.global
    }

    pub fn global_options(&self) -> &[OptionDef] {
        self.global.options()
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Declaration errors, in the order they were found.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Fails when any declaration error was recorded.
    pub fn validate(&self) -> Result<(), FrameworkError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FrameworkError::InvalidDeclarations(self.errors.clone()))
        }
    }

    /// Parse `arguments` without running anything.
    pub fn invocation<I, S>(&self, arguments: I) -> Invocation<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(self, arguments)
    }

    /// Validate the declarations, then parse and run `arguments`.
    pub fn run<I, S>(&self, arguments: I) -> CliResult<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validate()?;
        let mut invocation = self.invocation(arguments);
        invocation.run()?;
        Ok(invocation.into_outcome())
    }

    /// Translate a run result into exit code and output text.
    pub fn respond(&self, result: CliResult<Outcome>) -> Response {
        match result {
            Ok(_) => Response::silent(),
            Err(CliError::Halt(halt)) => {
                let styled = if halt.exit_code() == 0 {
                    std::io::stdout().is_terminal()
                } else {
                    std::io::stderr().is_terminal()
                };
                Response {
                    exit_code: halt.exit_code(),
                    output: Output::Text(help::render(self, &halt, styled)),
                }
            }
            Err(e) => Response::error(e.exit_code(), e.to_string()),
        }
    }

    /// Run `arguments`, print the response and exit the process.
    pub fn run_and_exit<I, S>(&self, arguments: I) -> !
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let response = self.respond(self.run(arguments));
        response.print();
        std::process::exit(response.exit_code)
    }
}

/// Builds an [`App`], collecting declaration errors along the way.
pub struct AppBuilder {
    config: AppConfig,
    global: Command,
    commands: BTreeMap<String, Command>,
    errors: Vec<String>,
}

impl AppBuilder {
    /// Start an app. With `config.help` set, the global `help` flag is
    /// registered before any host option.
    pub fn new(description: impl Into<String>, config: AppConfig) -> Self {
        let mut builder = Self {
            global: Command::new(None, description),
            config,
            commands: BTreeMap::new(),
            errors: Vec::new(),
        };

        if builder.config.help {
            let result = OptionDef::new(
                HELP_OPTION,
                "Shows this help message",
                OptionSpec::new().short('h'),
            )
            .and_then(|option| builder.global.add_option(option, None));
            builder.record(result);
        }
        builder
    }

    /// Declare app-wide options and preconditions.
    ///
    /// Declare these before any command; commands only check their option
    /// keys against the global options that exist when they are declared.
    pub fn global<F>(&mut self, block: F) -> &mut Self
    where
        F: FnOnce(&mut CommandBuilder<'_>),
    {
        let mut builder = CommandBuilder {
            command: &mut self.global,
            global: None,
            errors: &mut self.errors,
        };
        block(&mut builder);
        self
    }

    /// Declare a subcommand. The block must bind exactly one handler.
    pub fn command<F>(&mut self, name: &str, description: &str, block: F) -> &mut Self
    where
        F: FnOnce(&mut CommandBuilder<'_>),
    {
        if self.commands.contains_key(name) {
            self.record(Err(DeclarationError::DuplicateCommand(name.to_string())));
            return self;
        }

        let mut command = Command::new(Some(name), description);
        let mut builder = CommandBuilder {
            command: &mut command,
            global: Some(&self.global),
            errors: &mut self.errors,
        };
        block(&mut builder);

        if command.handler().is_none() {
            self.record(Err(DeclarationError::MissingHandler(name.to_string())));
            return self;
        }

        debug!(command = %name, options = command.options().len(), "command declared");
        self.commands.insert(name.to_string(), command);
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn build(self) -> App {
        App {
            config: self.config,
            global: self.global,
            commands: self.commands,
            errors: self.errors,
        }
    }

    fn record(&mut self, result: Result<(), DeclarationError>) {
        record(&mut self.errors, result);
    }
}

fn record(errors: &mut Vec<String>, result: Result<(), DeclarationError>) {
    if let Err(e) = result {
        debug!(error = %e, "declaration error");
        errors.push(e.to_string());
    }
}

/// Declares the options, preconditions and handler of one command.
pub struct CommandBuilder<'a> {
    command: &'a mut Command,
    global: Option<&'a Command>,
    errors: &'a mut Vec<String>,
}

impl CommandBuilder<'_> {
    /// The command under construction.
    pub fn command(&self) -> &Command {
        &*self.command
    }

    /// Declaration errors recorded so far for the whole app.
    pub fn errors(&self) -> &[String] {
        self.errors.as_slice()
    }

    pub fn option(&mut self, name: &str, description: &str, spec: OptionSpec) -> &mut Self {
        let result = OptionDef::new(name, description, spec)
            .and_then(|option| self.command.add_option(option, self.global));
        record(self.errors, result);
        self
    }

    /// Declare a precondition; `message` is reported when `predicate` fails.
    pub fn check<F>(&mut self, message: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> bool + 'static,
    {
        let result = self
            .command
            .add_precondition(message, Some(Box::new(predicate)));
        record(self.errors, result);
        self
    }

    /// Bind the command's handler.
    pub fn run<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Invocation<'_>) -> CliResult<()> + 'static,
    {
        let result = self.command.set_handler(Box::new(handler));
        record(self.errors, result);
        self
    }
}
