//! Classification of raw command-line tokens.

use crate::option::identifier;

/// What a single argument-list token means to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare run of dashes such as `--`: every later token is positional.
    EndOfOptions,
    /// Three or more leading dashes.
    Malformed,
    /// `--no-<name>`, carrying the option identifier.
    Negated(String),
    /// `--<name>`, carrying the option identifier.
    Long(String),
    /// `-x`.
    Short(char),
    /// `-xyz`: every character is a separate flag.
    Cluster(Vec<char>),
    /// Subcommand name or positional argument.
    Positional,
}

impl Token {
    /// Classify `raw`. Once `literal` is set, every token is positional.
    pub fn classify(raw: &str, literal: bool) -> Self {
        if literal || !raw.starts_with('-') {
            return Token::Positional;
        }
        if raw.chars().all(|c| c == '-') {
            return Token::EndOfOptions;
        }
        if raw.starts_with("---") {
            return Token::Malformed;
        }
        if let Some(name) = raw.strip_prefix("--no-") {
            return Token::Negated(identifier(name));
        }
        if let Some(name) = raw.strip_prefix("--") {
            return Token::Long(identifier(name));
        }

        let chars: Vec<char> = raw[1..].chars().collect();
        match chars.as_slice() {
            [c] => Token::Short(*c),
            _ => Token::Cluster(chars),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_runs_end_options() {
        assert_eq!(Token::classify("--", false), Token::EndOfOptions);
        assert_eq!(Token::classify("-", false), Token::EndOfOptions);
        assert_eq!(Token::classify("----", false), Token::EndOfOptions);
    }

    #[test]
    fn test_literal_mode_is_positional() {
        assert_eq!(Token::classify("--", true), Token::Positional);
        assert_eq!(Token::classify("-rs", true), Token::Positional);
        assert_eq!(Token::classify("--pager", true), Token::Positional);
    }

    #[test]
    fn test_option_shapes() {
        assert_eq!(Token::classify("---pager", false), Token::Malformed);
        assert_eq!(
            Token::classify("--no-ignore-cache", false),
            Token::Negated("ignore_cache".into())
        );
        assert_eq!(
            Token::classify("--ignore-cache", false),
            Token::Long("ignore_cache".into())
        );
        assert_eq!(Token::classify("-p", false), Token::Short('p'));
        assert_eq!(Token::classify("-ps", false), Token::Cluster(vec!['p', 's']));
    }

    #[test]
    fn test_plain_words_are_positional() {
        assert_eq!(Token::classify("show", false), Token::Positional);
        assert_eq!(Token::classify("", false), Token::Positional);
        assert_eq!(Token::classify("a-b", false), Token::Positional);
    }
}
