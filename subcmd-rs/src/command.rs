//! Commands: an option scope, a precondition list and a handler.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use crate::error::DeclarationError;
use crate::invocation::Invocation;
use crate::option::OptionDef;
use crate::value::{Opts, Value};
use crate::CliResult;

/// Execution block of a command.
pub type Handler = Box<dyn Fn(&mut Invocation<'_>) -> CliResult<()>>;

/// Predicate evaluated before a command's handler runs.
pub type Predicate = Box<dyn Fn(&Invocation<'_>) -> bool>;

/// A named predicate; its message is reported when the predicate fails.
pub struct Precondition {
    message: String,
    predicate: Predicate,
}

impl Precondition {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn holds(&self, invocation: &Invocation<'_>) -> bool {
        (self.predicate)(invocation)
    }
}

/// A subcommand, or the unnamed global command holding app-wide options.
pub struct Command {
    name: Option<String>,
    description: String,
    options: Vec<OptionDef>,
    // name, long and short spellings -> index into `options`
    keys: HashMap<String, usize>,
    preconditions: Vec<Precondition>,
    handler: Option<Handler>,
    defaults: OnceCell<Opts>,
}

impl Command {
    /// Create a command; `None` names the global command.
    pub fn new(name: Option<&str>, description: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            description: description.into(),
            options: Vec::new(),
            keys: HashMap::new(),
            preconditions: Vec::new(),
            handler: None,
            defaults: OnceCell::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_global(&self) -> bool {
        self.name.is_none()
    }

    /// Declared options, in declaration order.
    pub fn options(&self) -> &[OptionDef] {
        &self.options
    }

    /// Look an option up by name, long or short spelling.
    pub fn option(&self, key: &str) -> Option<&OptionDef> {
        self.keys.get(key).map(|&index| &self.options[index])
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Register an option.
    ///
    /// Its keys must not collide with this command's keys nor, for named
    /// commands, with the keys of `global`.
    pub fn add_option(
        &mut self,
        option: OptionDef,
        global: Option<&Command>,
    ) -> Result<(), DeclarationError> {
        let global = global.filter(|_| !self.is_global());
        let keys = option.keys();

        for key in &keys {
            let taken = self.has_option(key) || global.is_some_and(|g| g.has_option(key));
            if taken {
                return Err(DeclarationError::DuplicateOptionKey(key.clone()));
            }
        }

        let index = self.options.len();
        self.options.push(option);
        for key in keys {
            self.keys.insert(key, index);
        }
        self.defaults.take();
        Ok(())
    }

    /// Append a precondition. A missing predicate is a declaration error.
    pub fn add_precondition(
        &mut self,
        message: impl Into<String>,
        predicate: Option<Predicate>,
    ) -> Result<(), DeclarationError> {
        let predicate = predicate.ok_or(DeclarationError::MissingPredicate)?;
        self.preconditions.push(Precondition {
            message: message.into(),
            predicate,
        });
        Ok(())
    }

    /// Bind the execution block; a command has exactly one.
    pub fn set_handler(&mut self, handler: Handler) -> Result<(), DeclarationError> {
        if self.handler.is_some() {
            return Err(DeclarationError::DuplicateHandler(
                self.name.clone().unwrap_or_default(),
            ));
        }
        self.handler = Some(handler);
        Ok(())
    }

    /// Declared defaults, keyed by canonical option name.
    ///
    /// Unset defaults and `false` flags are left out, so only meaningful
    /// values seed the bound options of an invocation.
    pub fn default_option_values(&self) -> &Opts {
        self.defaults.get_or_init(|| {
            self.options
                .iter()
                .filter_map(|option| match option.default_value() {
                    None | Some(Value::Flag(false)) => None,
                    Some(value) => Some((option.name().to_string(), value.clone())),
                })
                .collect()
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("preconditions", &self.preconditions.len())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::OptionSpec;

    fn noop(_: &mut Invocation<'_>) -> CliResult<()> {
        Ok(())
    }

    fn always(_: &Invocation<'_>) -> bool {
        true
    }

    fn option(name: &str, spec: OptionSpec) -> OptionDef {
        OptionDef::new(name, "description", spec).unwrap()
    }

    #[test]
    fn test_option_reachable_by_every_key() {
        let mut command = Command::new(Some("edit"), "desc");
        command
            .add_option(option("name", OptionSpec::new().short('n').long("long")), None)
            .unwrap();

        assert_eq!(command.options().len(), 1);
        for key in ["name", "long", "n"] {
            assert_eq!(command.option(key).map(OptionDef::name), Some("name"));
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let mut command = Command::new(Some("edit"), "desc");
        command
            .add_option(option("name", OptionSpec::new().short('n').long("long")), None)
            .unwrap();

        let dup_short = command.add_option(option("none", OptionSpec::new().short('n')), None);
        assert_eq!(dup_short, Err(DeclarationError::DuplicateOptionKey("n".into())));
        assert!(command.add_option(option("name", OptionSpec::new()), None).is_err());
        assert!(command.add_option(option("long", OptionSpec::new()), None).is_err());
        assert_eq!(command.options().len(), 1);
    }

    #[test]
    fn test_duplicate_detection_spans_global_scope() {
        let mut global = Command::new(None, "app");
        global
            .add_option(option("verbose", OptionSpec::new().short('v')), None)
            .unwrap();

        let mut command = Command::new(Some("show"), "desc");
        let err = command
            .add_option(option("version", OptionSpec::new().short('v')), Some(&global))
            .unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateOptionKey("v".into()));

        // The global command only checks its own scope.
        let mut other = Command::new(None, "app");
        assert!(other
            .add_option(option("verbose", OptionSpec::new()), Some(&global))
            .is_ok());
    }

    #[test]
    fn test_second_handler_rejected() {
        let mut command = Command::new(Some("edit"), "desc");
        assert!(command.handler().is_none());
        command.set_handler(Box::new(noop)).unwrap();
        assert!(command.handler().is_some());

        let err = command.set_handler(Box::new(noop)).unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateHandler("edit".into()));
    }

    #[test]
    fn test_precondition_requires_predicate() {
        let mut command = Command::new(Some("edit"), "desc");
        command
            .add_precondition("Message", Some(Box::new(always)))
            .unwrap();
        assert_eq!(command.preconditions().len(), 1);
        assert_eq!(command.preconditions()[0].message(), "Message");

        let err = command.add_precondition("Message", None).unwrap_err();
        assert_eq!(err, DeclarationError::MissingPredicate);
        assert_eq!(command.preconditions().len(), 1);
    }

    #[test]
    fn test_default_option_values() {
        let mut command = Command::new(Some("complex"), "desc");
        command
            .add_option(option("dest", OptionSpec::new().default("/tmp")), None)
            .unwrap();
        command
            .add_option(option("num_lines", OptionSpec::new().default(0).short('n')), None)
            .unwrap();
        command.add_option(option("quiet", OptionSpec::new()), None).unwrap();
        command
            .add_option(option("color", OptionSpec::new().default(true)), None)
            .unwrap();

        let defaults = command.default_option_values();
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults["dest"], Value::Str("/tmp".into()));
        assert_eq!(defaults["num_lines"], Value::Int(0));
        assert_eq!(defaults["color"], Value::Flag(true));
        assert!(!defaults.contains_key("quiet"));
        assert!(!defaults.contains_key("n"));
    }
}
