//! Per-run dispatcher.
//!
//! An [`Invocation`] parses one argument list eagerly when it is created,
//! then runs the selected command once. While running, handlers may dispatch
//! other commands through [`Invocation::run_command`]; the caller's state is
//! saved on an internal stack and restored when the nested command returns.
//!
//! ```text
//! Parsed --run()--> Running --handler returns--> Finished
//!                     |  ^
//!        run_command  v  |  pop
//!                Running (nested)
//! ```

use std::mem;

use serde::Serialize;
use tracing::{debug, trace};

use crate::app::{App, HELP_OPTION};
use crate::command::Command;
use crate::error::{FrameworkError, ParseError};
use crate::help::{Halt, HaltReason};
use crate::option::OptionDef;
use crate::token::Token;
use crate::value::{Opts, Value};
use crate::{CliError, CliResult};

const NO_COMMAND: &str = "No command given";

/// Lifecycle of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Arguments parsed, not run yet.
    Parsed,
    Running,
    Finished,
}

/// Overrides for a nested command dispatch.
///
/// Unset `args`/`opts` pass the caller's current values through unchanged.
/// Preconditions are checked unless [`Nested::skip_check`] is used.
///
/// ```
/// use subcmd::Nested;
///
/// let fresh = Nested::new().args(Vec::<String>::new());
/// let unchecked = Nested::new().skip_check();
/// # let _ = (fresh, unchecked);
/// ```
#[derive(Debug, Clone)]
pub struct Nested {
    args: Option<Vec<String>>,
    opts: Option<Opts>,
    check: bool,
}

impl Nested {
    pub fn new() -> Self {
        Self {
            args: None,
            opts: None,
            check: true,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn opts(mut self, opts: Opts) -> Self {
        self.opts = Some(opts);
        self
    }

    /// Run the nested command without checking errors or preconditions.
    pub fn skip_check(mut self) -> Self {
        self.check = false;
        self
    }
}

impl Default for Nested {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// Name of the invoked command.
    pub command: Option<String>,
    /// Positional arguments, in order.
    pub args: Vec<String>,
    /// Bound options, keyed by canonical name.
    pub opts: Opts,
}

struct Frame<'app> {
    command: Option<&'app Command>,
    args: Vec<String>,
    opts: Opts,
    errors: Vec<String>,
}

/// Dispatcher state for one argument list.
pub struct Invocation<'app> {
    app: &'app App,
    command: Option<&'app Command>,
    args: Vec<String>,
    opts: Opts,
    errors: Vec<String>,
    stack: Vec<Frame<'app>>,
    status: Status,
}

impl<'app> Invocation<'app> {
    /// Parse `arguments` against the commands of `app`.
    ///
    /// Problems in the argument list are recorded, never returned; they stop
    /// the run in its check phase.
    pub fn new<I, S>(app: &'app App, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut invocation = Self {
            app,
            command: None,
            args: Vec::new(),
            opts: Opts::new(),
            errors: Vec::new(),
            stack: Vec::new(),
            status: Status::Parsed,
        };
        invocation.parse(arguments.into_iter().map(Into::into));
        invocation
    }

    pub fn app(&self) -> &'app App {
        self.app
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Name of the active command.
    pub fn command(&self) -> Option<&'app str> {
        self.command.and_then(Command::name)
    }

    /// Positional arguments of the active command.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Bound options of the active command.
    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.opts.get(name)
    }

    /// Whether flag `name` is bound to `true`.
    pub fn flag(&self, name: &str) -> bool {
        self.value(name).and_then(Value::as_flag).unwrap_or(false)
    }

    /// Errors recorded for the active command, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Current nesting level of [`run_command`](Self::run_command) calls.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn parse(&mut self, arguments: impl Iterator<Item = String>) {
        let mut tokens = arguments;
        let mut literal = false;

        while let Some(raw) = tokens.next() {
            match Token::classify(&raw, literal) {
                Token::EndOfOptions => {
                    trace!(token = %raw, "literal mode");
                    literal = true;
                }
                Token::Malformed => self.record(ParseError::InvalidOption(raw)),
                Token::Negated(name) => self.bind_negated(&name),
                Token::Long(name) => self.bind(&name, &raw, &mut tokens),
                Token::Short(c) => self.bind(&c.to_string(), &raw, &mut tokens),
                Token::Cluster(chars) => {
                    for c in chars {
                        self.bind_clustered(c);
                    }
                }
                Token::Positional => self.accept_positional(raw, literal),
            }
        }

        debug!(
            command = ?self.command(),
            args = ?self.args,
            opts = ?self.opts,
            errors = self.errors.len(),
            "arguments parsed"
        );
    }

    /// Active command's options first, then the global ones.
    fn resolve(&self, key: &str) -> Option<&'app OptionDef> {
        self.command
            .and_then(|command| command.option(key))
            .or_else(|| self.app.global().option(key))
    }

    fn bind(&mut self, key: &str, raw: &str, rest: &mut impl Iterator<Item = String>) {
        let Some(option) = self.resolve(key) else {
            self.record(ParseError::InvalidOption(raw.to_string()));
            return;
        };

        let value = if option.is_flag() {
            Ok(Value::Flag(true))
        } else {
            option.coerce(rest.next().as_deref())
        };

        match value {
            Ok(value) => {
                self.opts.insert(option.name().to_string(), value);
            }
            Err(e) => self.record(e),
        }
    }

    fn bind_negated(&mut self, key: &str) {
        match self.resolve(key) {
            Some(option) if option.is_flag() => {
                self.opts.insert(option.name().to_string(), Value::Flag(false));
            }
            Some(_) => self.record(ParseError::InvalidNegation(key.to_string())),
            None => self.record(ParseError::InvalidOption(format!("--no-{}", key))),
        }
    }

    fn bind_clustered(&mut self, c: char) {
        match self.resolve(&c.to_string()) {
            Some(option) if option.is_flag() => {
                self.opts.insert(option.name().to_string(), Value::Flag(true));
            }
            Some(_) => self.record(ParseError::ClusteredValue(c)),
            None => self.record(ParseError::InvalidOption(format!("-{}", c))),
        }
    }

    fn accept_positional(&mut self, token: String, literal: bool) {
        if !literal && self.command.is_none() && self.args.is_empty() {
            if let Some(command) = self.app.command(&token) {
                debug!(command = %token, "command selected");
                // Options bound before the command name keep their values.
                let mut opts = command.default_option_values().clone();
                opts.append(&mut self.opts);
                self.opts = opts;
                self.command = Some(command);
                return;
            }
        }
        self.args.push(token);
    }

    fn record(&mut self, error: ParseError) {
        trace!(error = %error, "parse error");
        self.errors.push(error.to_string());
    }

    /// Run the selected command. Allowed once per invocation.
    pub fn run(&mut self) -> CliResult<()> {
        if self.status != Status::Parsed {
            return Err(FrameworkError::AlreadyRun.into());
        }
        self.status = Status::Running;

        let result = self.check().and_then(|()| self.execute());

        self.status = Status::Finished;
        result
    }

    /// Dispatch another registered command from inside a running handler.
    ///
    /// The caller's command, arguments, options and errors are restored
    /// when the nested command returns, whether it succeeded or not.
    pub fn run_command(&mut self, name: &str, nested: Nested) -> CliResult<()> {
        if self.status != Status::Running {
            return Err(FrameworkError::NotRunning.into());
        }

        self.push(name, nested.args, nested.opts)?;

        let checked = if nested.check { self.check() } else { Ok(()) };
        let result = checked.and_then(|()| self.execute());

        self.pop()?;
        result
    }

    fn push(
        &mut self,
        name: &str,
        args: Option<Vec<String>>,
        opts: Option<Opts>,
    ) -> Result<(), FrameworkError> {
        let target = self
            .app
            .command(name)
            .ok_or_else(|| FrameworkError::UnknownCommand(name.to_string()))?;

        let args = args.unwrap_or_else(|| self.args.clone());
        let opts = opts.unwrap_or_else(|| self.opts.clone());

        self.stack.push(Frame {
            command: self.command.replace(target),
            args: mem::replace(&mut self.args, args),
            opts: mem::replace(&mut self.opts, opts),
            errors: mem::take(&mut self.errors),
        });
        debug!(command = %name, depth = self.stack.len(), "nested command pushed");
        Ok(())
    }

    fn pop(&mut self) -> Result<(), FrameworkError> {
        let frame = self.stack.pop().ok_or(FrameworkError::StackUnderflow)?;

        self.command = frame.command;
        self.args = frame.args;
        self.opts = frame.opts;
        self.errors = frame.errors;
        debug!(depth = self.stack.len(), "nested command popped");
        Ok(())
    }

    /// Check phase: help request, recorded errors, a selected command, then
    /// global and command preconditions in declaration order. Stops at the
    /// first failure.
    fn check(&mut self) -> CliResult<()> {
        if self.app.config().help && self.flag(HELP_OPTION) {
            return Err(self.halt(HaltReason::HelpRequested));
        }
        if self.has_errors() {
            return Err(self.halt(HaltReason::Errors));
        }

        let Some(command) = self.command else {
            self.errors.push(NO_COMMAND.to_string());
            return Err(self.halt(HaltReason::Errors));
        };

        let global = self.app.global().preconditions();
        for precondition in global.iter().chain(command.preconditions()) {
            if !precondition.holds(self) {
                self.errors.push(precondition.message().to_string());
                return Err(self.halt(HaltReason::Errors));
            }
        }
        Ok(())
    }

    /// Halt the running command with `message` unless `condition` holds.
    ///
    /// For handlers that validate their input beyond the declared
    /// preconditions; the message is rendered like a failed precondition.
    pub fn require(&mut self, condition: bool, message: &str) -> CliResult<()> {
        if condition {
            return Ok(());
        }
        self.errors.push(message.to_string());
        Err(self.halt(HaltReason::Errors))
    }

    /// A help halt for the active command, to be returned from a handler.
    pub fn help(&self) -> CliError {
        self.halt(HaltReason::HelpRequested)
    }

    fn halt(&self, reason: HaltReason) -> CliError {
        let halt = Halt::new(reason, self.command(), self.errors.clone());
        debug!(reason = ?reason, last_error = ?halt.last_error(), "check phase halted");
        CliError::Halt(halt)
    }

    fn execute(&mut self) -> CliResult<()> {
        let command = self
            .command
            .ok_or_else(|| FrameworkError::NotExecutable(String::new()))?;
        let handler = command.handler().ok_or_else(|| {
            FrameworkError::NotExecutable(command.name().unwrap_or_default().to_string())
        })?;

        debug!(command = ?command.name(), depth = self.stack.len(), "executing");
        handler(self)
    }

    /// Consume a finished invocation into its outcome.
    pub fn into_outcome(self) -> Outcome {
        Outcome {
            command: self.command().map(str::to_string),
            args: self.args,
            opts: self.opts,
        }
    }
}
