//! Positional command-line surface for `intserver`.

use std::num::NonZeroUsize;

use clap::Parser;

use crate::bootstrap::Overrides;

/// Serves expression validation and numerical integration over TCP.
#[derive(Parser, Debug)]
#[command(name = "intserver", version)]
pub(crate) struct Cli {
    /// Port to listen on; 0 selects the default.
    #[arg(value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Maximum number of connections served at once.
    #[arg(value_name = "MAX_THREADS")]
    pub(crate) max_threads: Option<NonZeroUsize>,
}

impl Cli {
    pub(crate) fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            max_threads: self.max_threads.map(NonZeroUsize::get),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["intserver"], None, None)]
    #[case(&["intserver", "0"], Some(0), None)]
    #[case(&["intserver", "6000", "4"], Some(6000), Some(4))]
    fn parses_positionals(
        #[case] args: &[&str],
        #[case] port: Option<u16>,
        #[case] max_threads: Option<usize>,
    ) {
        let cli = Cli::try_parse_from(args).expect("valid arguments");
        assert_eq!(cli.overrides(), Overrides { port, max_threads });
    }

    #[rstest]
    #[case(&["intserver", "70000"])]
    #[case(&["intserver", "port"])]
    #[case(&["intserver", "5142", "0"])]
    #[case(&["intserver", "5142", "-2"])]
    #[case(&["intserver", "5142", "4", "extra"])]
    fn rejects_invalid_positionals(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
