//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// fileinstall - Install and reconcile the contents of watched directories
#[derive(Parser, Debug)]
#[command(name = "fileinstall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Property file (toml, json or yaml) with fileinstall.* keys
    #[arg(short, long, global = true, env = "FILEINSTALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Set a property, overriding the property file and the environment
    #[arg(long = "set", value_name = "KEY=VALUE", global = true, value_parser = parse_key_value)]
    pub properties: Vec<(String, String)>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Directory selection shared by the commands that monitor.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryArgs {
    /// Directory to monitor (repeatable, same as fileinstall.dir)
    #[arg(short, long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Only scan the top level of each directory
    #[arg(long)]
    pub flat: bool,

    /// Home path substituted in schemes (same as fileinstall.home)
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Monitor directories until interrupted
    ///
    /// Every registration, update and removal is logged.
    ///
    /// Examples:
    ///   fileinstall run -d ./install              # Poll every 5 seconds
    ///   fileinstall run -d ./install -i 500       # Poll every 500 ms
    ///   fileinstall run -d ./install --json       # One JSON line per event
    Run {
        #[command(flatten)]
        directories: DirectoryArgs,

        /// Poll interval in milliseconds
        #[arg(short, long, value_name = "MILLIS")]
        interval: Option<u64>,

        /// Create missing directories at start
        #[arg(long)]
        autocreate: bool,

        /// Print each event as a JSON line on stdout
        #[arg(long)]
        json: bool,

        /// Stop after this many milliseconds instead of waiting for Ctrl-C
        #[arg(long, value_name = "MILLIS")]
        exit_after: Option<u64>,
    },

    /// Scan directories once and list what would be installed
    Scan {
        #[command(flatten)]
        directories: DirectoryArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the scheme a monitor for a directory would own
    Scheme {
        /// Directory to derive the scheme for
        dir: PathBuf,

        /// Home path substituted in the scheme key
        #[arg(long, value_name = "DIR")]
        home: Option<PathBuf>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["fileinstall", "run", "-d", "/a", "--dir", "/b", "-i", "250", "--json"])
            .unwrap();
        let Some(Commands::Run {
            directories,
            interval,
            json,
            ..
        }) = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(directories.dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(interval, Some(250));
        assert!(json);
    }

    #[test]
    fn test_set_is_global() {
        let cli = Cli::try_parse_from([
            "fileinstall",
            "scan",
            "--set",
            "fileinstall.priority=5",
            "--set",
            "fileinstall.writeback=true",
        ])
        .unwrap();
        assert_eq!(
            cli.properties,
            vec![
                ("fileinstall.priority".to_string(), "5".to_string()),
                ("fileinstall.writeback".to_string(), "true".to_string())
            ]
        );
    }

    #[test]
    fn test_set_requires_separator() {
        assert!(Cli::try_parse_from(["fileinstall", "--set", "novalue", "scan"]).is_err());
        assert!(Cli::try_parse_from(["fileinstall", "--set", "=x", "scan"]).is_err());
    }

    #[test]
    fn test_value_may_contain_equals() {
        assert_eq!(parse_key_value("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
