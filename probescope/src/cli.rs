//! CLI argument definitions for the operator surface.
//!
//! Hosts embedding the engine hand the operator's argv to
//! [`Args::try_parse_from`] and feed the result to
//! [`crate::commands::dispatch`].

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "probescope",
    version,
    about = "Trace allocations, locks and clones of a debugged process",
    after_help = "\
EXAMPLES:
    probescope enable                        Enable every tracing module
    probescope enable -m memory,clone        Enable selected modules
    probescope report -m memory -p myapp     Report, keeping only myapp frames
    probescope report -o run1                Write run1.<module>.prof files"
)]
pub struct Args {
    /// Action applied to the selected tracing modules
    #[arg(value_enum)]
    pub action: Action,

    /// Comma-separated tracing module names (default: all modules)
    #[arg(short, long, value_delimiter = ',')]
    pub module: Vec<String>,

    /// Subject crate name used to trim library-internal stack frames
    #[arg(short, long)]
    pub program: Option<String>,

    /// Output file prefix for reports: <prefix>.<module>.prof
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Install a module's breakpoints on the selected target
    Enable,
    /// Tear a module's breakpoints down again
    Disable,
    /// Write each enabled module's profile to disk
    Report,
    /// Show which modules are enabled on the selected target
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("probescope").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn action_and_module_list_parse() {
        let args = parse(&["enable", "-m", "memory,clone"]);
        assert_eq!(args.action, Action::Enable);
        assert_eq!(args.module, vec!["memory", "clone"]);
    }

    #[test]
    fn modules_default_to_empty_meaning_all() {
        let args = parse(&["list"]);
        assert_eq!(args.action, Action::List);
        assert!(args.module.is_empty());
    }

    #[test]
    fn report_takes_prefix_and_program() {
        let args = parse(&["report", "-o", "run1", "-p", "myapp"]);
        assert_eq!(args.action, Action::Report);
        assert_eq!(args.output.as_deref(), Some("run1"));
        assert_eq!(args.program.as_deref(), Some("myapp"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result =
            Args::try_parse_from(["probescope", "profile"]);
        assert!(result.is_err());
    }
}
