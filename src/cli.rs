//! CLI argument parsing for syscall-hunter

use crate::config::HunterConfig;
use crate::mapper::MatchMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the run summary printed on stdout
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON reports for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "syscall-hunter")]
#[command(version)]
#[command(
    about = "Find the system calls C/C++ repositories depend on, via their header closure and call sites",
    long_about = None
)]
pub struct Cli {
    /// Directory whose subdirectories are the repositories to analyse
    #[arg(long = "mrepo", value_name = "DIR")]
    pub mrepo: Option<PathBuf>,

    /// Root directory under which included headers are resolved
    #[arg(long = "include-root", visible_alias = "compiler", value_name = "DIR")]
    pub include_root: Option<PathBuf>,

    /// Directory where output files are created (cleared first)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Syscall reference table (`<number> <name> ...` per line)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Fall back to the built-in x86_64 syscall table when the catalog file is absent
    #[arg(long = "builtin-catalog")]
    pub builtin_catalog: bool,

    /// TOML configuration file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not write the syscall -> header association
    #[arg(long = "no-echo")]
    pub no_echo: bool,

    /// Do not write header list, per-file syscalls and line numbers
    #[arg(long = "no-dev-echo")]
    pub no_dev_echo: bool,

    /// Analyse repositories in parallel
    #[arg(short = 't', long = "parallel")]
    pub parallel: bool,

    /// Match syscall names inside longer identifiers when mapping headers
    #[arg(long = "substring-match")]
    pub substring_match: bool,

    /// Also follow `#include "..."` directives of source files
    #[arg(long = "follow-local-includes")]
    pub follow_local_includes: bool,

    /// Extract identifiers and query them with --lookup-cmd
    #[arg(long)]
    pub api: bool,

    /// Identifier lookup command, run as `<cmd> <version> ident <name> C`
    #[arg(long = "lookup-cmd", value_name = "CMD")]
    pub lookup_cmd: Option<PathBuf>,

    /// Version of the referenced code base passed to the lookup command
    #[arg(long = "target-version", value_name = "VERSION")]
    pub target_version: Option<String>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line flags on top of `base`
    pub fn apply(&self, mut base: HunterConfig) -> HunterConfig {
        if let Some(mrepo) = &self.mrepo {
            base.repositories = mrepo.clone();
        }
        if let Some(root) = &self.include_root {
            base.include_root = root.clone();
        }
        if let Some(output) = &self.output {
            base.output = output.clone();
        }
        if let Some(catalog) = &self.catalog {
            base.catalog = catalog.clone();
        }
        if self.builtin_catalog {
            base.builtin_catalog = true;
        }
        if self.no_echo {
            base.echo = false;
        }
        if self.no_dev_echo {
            base.dev_echo = false;
        }
        if self.parallel {
            base.parallel = true;
        }
        if self.substring_match {
            base.match_mode = MatchMode::Substring;
        }
        if self.follow_local_includes {
            base.follow_local_includes = true;
        }
        if self.api {
            base.api.enabled = true;
        }
        if let Some(cmd) = &self.lookup_cmd {
            base.api.lookup_cmd = Some(cmd.clone());
        }
        if let Some(version) = &self.target_version {
            base.api.target_version = version.clone();
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_required_locations() {
        let cli = Cli::parse_from([
            "syscall-hunter",
            "--mrepo",
            "repos",
            "--include-root",
            "/usr/include",
            "--output",
            "out",
        ]);
        assert_eq!(cli.mrepo, Some(PathBuf::from("repos")));
        assert_eq!(cli.include_root, Some(PathBuf::from("/usr/include")));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_cli_compiler_alias() {
        let cli = Cli::parse_from(["syscall-hunter", "--compiler", "/sysroot/usr/include"]);
        assert_eq!(cli.include_root, Some(PathBuf::from("/sysroot/usr/include")));
    }

    #[test]
    fn test_cli_flags_default_false() {
        let cli = Cli::parse_from(["syscall-hunter"]);
        assert!(!cli.parallel);
        assert!(!cli.api);
        assert!(!cli.no_echo);
        assert!(!cli.substring_match);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_short_parallel_flag() {
        let cli = Cli::parse_from(["syscall-hunter", "-t"]);
        assert!(cli.parallel);
    }

    #[test]
    fn test_apply_overrides_config() {
        let cli = Cli::parse_from([
            "syscall-hunter",
            "--mrepo",
            "repos",
            "--no-echo",
            "--substring-match",
            "--api",
            "--lookup-cmd",
            "query.py",
            "--target-version",
            "v6.1",
        ]);
        let base = HunterConfig {
            repositories: PathBuf::from("from-file"),
            output: PathBuf::from("kept"),
            ..Default::default()
        };
        let config = cli.apply(base);

        assert_eq!(config.repositories, PathBuf::from("repos"));
        assert_eq!(config.output, PathBuf::from("kept"));
        assert!(!config.echo);
        assert!(config.dev_echo);
        assert_eq!(config.match_mode, MatchMode::Substring);
        assert!(config.api.enabled);
        assert_eq!(config.api.lookup_cmd, Some(PathBuf::from("query.py")));
        assert_eq!(config.api.target_version, "v6.1");
    }

    #[test]
    fn test_cli_format_json() {
        let cli = Cli::parse_from(["syscall-hunter", "--format", "json"]);
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
