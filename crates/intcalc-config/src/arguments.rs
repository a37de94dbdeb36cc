//! Separation of configuration flags from positional arguments.
//!
//! Configuration flags must precede the positional arguments; everything
//! from the first token that is not a known configuration flag onwards is
//! left for the binary's own parser.

use std::ffi::{OsStr, OsString};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if crate::CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split between the configuration loader and the CLI parser.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ArgumentSplit {
    /// Program name followed by the leading configuration flags.
    pub config_arguments: Vec<OsString>,
    /// Program name followed by every remaining token.
    pub cli_arguments: Vec<OsString>,
}

/// Splits `args` at the first token that is not a configuration flag.
///
/// The program name is copied to both halves. A configuration flag without
/// an inline `=value` takes the next token as its value.
#[must_use]
pub fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut cli_arguments = vec![program.clone()];

    while let Some(argument) = remaining.next() {
        match classify_flag(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    config_arguments.push(value.clone());
                }
            }
            FlagAction::Stop => {
                cli_arguments.push(argument.clone());
                break;
            }
        }
    }
    cli_arguments.extend(remaining.cloned());

    ArgumentSplit {
        config_arguments,
        cli_arguments,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--log-filter", FlagAction::Include { needs_value: true })]
    #[case("--port", FlagAction::Include { needs_value: true })]
    #[case("-v", FlagAction::Stop)]
    #[case("--unknown", FlagAction::Stop)]
    #[case("5142", FlagAction::Stop)]
    fn classifies_flags(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify_flag(OsStr::new(argument)), expected);
    }

    #[test]
    fn leading_config_flags_go_to_the_loader() {
        let split = split_arguments(&os(&[
            "intcalc",
            "--log-filter",
            "debug",
            "--log-format=json",
            "-v",
            "6000",
            "jobs.txt",
        ]));
        assert_eq!(
            split.config_arguments,
            os(&["intcalc", "--log-filter", "debug", "--log-format=json"])
        );
        assert_eq!(split.cli_arguments, os(&["intcalc", "-v", "6000", "jobs.txt"]));
    }

    #[test]
    fn flags_after_positionals_stay_positional() {
        let split = split_arguments(&os(&["intcalc", "6000", "--port", "7000"]));
        assert_eq!(split.config_arguments, os(&["intcalc"]));
        assert_eq!(
            split.cli_arguments,
            os(&["intcalc", "6000", "--port", "7000"])
        );
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        assert_eq!(split_arguments(&[]), ArgumentSplit::default());
    }
}
