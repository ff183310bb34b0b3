//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

/// Run an API test suite once per argument, each against its own generated environment
#[derive(Parser, Debug, Clone)]
#[command(name = "suite-fanout")]
#[command(version)]
#[command(about = "Fan a parameterized API test suite out over generated environments")]
#[command(long_about = None)]
pub struct Args {
    /// Collection files to run (looked up under $HOME/<folder> when not found as given)
    #[arg(long, num_args = 1.., required = true)]
    pub testfiles: Vec<PathBuf>,

    /// Iteration data file shared by every run of a suite
    #[arg(long)]
    pub datafile: Option<PathBuf>,

    /// Environment template; each `%s` placeholder receives the run argument
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Run arguments, one run per value for every suite
    #[arg(long, num_args = 1..)]
    pub globals: Vec<String>,

    /// Per-run timeout in milliseconds [default: 30000]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print request and result details for every execution
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print only the summary line of each suite
    #[arg(short, long)]
    pub quiet: bool,

    /// Folder under the home directory searched for suites [default: ExampleFolder]
    #[arg(long)]
    pub folder: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Engine executable [default: newman]
    #[arg(long)]
    pub newman: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let args = Args::try_parse_from([
            "suite-fanout",
            "--testfiles",
            "Tenacious.json",
            "Other.json",
            "--globals",
            "Beelzaboss",
            "Kickapoo",
            "--timeout",
            "30000",
            "-v",
        ])
        .unwrap();

        assert_eq!(
            args.testfiles,
            vec![PathBuf::from("Tenacious.json"), PathBuf::from("Other.json")]
        );
        assert_eq!(args.globals, vec!["Beelzaboss", "Kickapoo"]);
        assert_eq!(args.timeout, Some(30000));
        assert!(args.verbose);
        assert!(!args.quiet);
        assert!(args.datafile.is_none());
    }

    #[test]
    fn test_testfiles_required() {
        assert!(Args::try_parse_from(["suite-fanout", "--globals", "a"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["suite-fanout", "--testfiles", "a.json", "-v", "-q"]).is_err());
    }
}
