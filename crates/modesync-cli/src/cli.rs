//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use modesync_core::{TargetKind, TargetSelection};
use modesync_meta::{StrategyOverrides, ValidationLevel};

/// modesync - Sync custom mode definitions into the host's mode configuration
#[derive(Parser, Debug)]
#[command(name = "modesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Discover, validate and merge mode records into the target files
    ///
    /// Examples:
    ///   modesync sync                        # Sync ./modes into the global target
    ///   modesync sync --target both          # Also write <project>/.roomodes
    ///   modesync sync --dry-run              # Show the diff, write nothing
    ///   modesync sync --validate-only        # Only validate the mode files
    ///   modesync sync --list-modes --json    # List discovered modes as JSON
    ///   modesync sync --strategy category --category-order core,specialized
    ///   modesync sync --priority code,debug --exclude old-mode
    Sync(SyncArgs),

    /// Manage target backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Generate shell completion scripts
    ///
    /// Examples:
    ///   modesync completions bash > ~/.local/share/bash-completion/completions/modesync
    ///   modesync completions zsh > ~/.zfunc/_modesync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Paths shared by every command that touches targets
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    /// Project directory holding .modesync.toml and .roomodes
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// User settings directory (defaults to <config_dir>/modesync)
    #[arg(long, value_name = "DIR", env = "MODESYNC_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Global target file
    #[arg(long, value_name = "FILE", env = "MODESYNC_GLOBAL_TARGET")]
    pub global_target: Option<PathBuf>,

    /// Local target file
    #[arg(long, value_name = "FILE", env = "MODESYNC_LOCAL_TARGET")]
    pub local_target: Option<PathBuf>,

    /// Backup root directory
    #[arg(long, value_name = "DIR", env = "MODESYNC_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncArgs {
    /// Compute and show the changes without writing anything
    #[arg(long, conflicts_with_all = ["validate_only", "list_modes"])]
    pub dry_run: bool,

    /// Only discover and validate; exit 1 on any blocking error
    #[arg(long, conflicts_with = "list_modes")]
    pub validate_only: bool,

    /// Only discover and list modes by category
    #[arg(long)]
    pub list_modes: bool,

    /// Ordering strategy: strategic, groupings, alphabetical, category or custom
    #[arg(long, value_name = "NAME")]
    pub strategy: Option<String>,

    /// Slugs moved to the front of the plan (comma-separated)
    #[arg(short, long, value_name = "SLUGS", value_delimiter = ',')]
    pub priority: Option<Vec<String>>,

    /// Slugs left out of the plan (comma-separated)
    #[arg(short, long, value_name = "SLUGS", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Category precedence for the category strategy (comma-separated)
    #[arg(long, value_name = "CATEGORIES", value_delimiter = ',')]
    pub category_order: Option<Vec<String>>,

    /// Explicit slug order for the custom strategy (comma-separated)
    #[arg(long, value_name = "SLUGS", value_delimiter = ',')]
    pub custom_order: Option<Vec<String>>,

    /// Which targets to write
    #[arg(long, value_enum, value_name = "TARGET")]
    pub target: Option<TargetArg>,

    /// Treat every schema deviation as a blocking error
    #[arg(long, conflicts_with = "permissive")]
    pub strict: bool,

    /// Auto-correct as much as possible
    #[arg(long)]
    pub permissive: bool,

    /// Emit the report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Do not back up targets before replacing them
    #[arg(long)]
    pub no_backup: bool,

    /// Directory of mode record files
    #[arg(long, value_name = "DIR", env = "MODESYNC_MODES_DIR")]
    pub modes_dir: Option<PathBuf>,

    #[command(flatten)]
    pub paths: PathArgs,
}

impl SyncArgs {
    /// Level requested on the command line, if any.
    pub fn level(&self) -> Option<ValidationLevel> {
        if self.strict {
            Some(ValidationLevel::Strict)
        } else if self.permissive {
            Some(ValidationLevel::Permissive)
        } else {
            None
        }
    }

    /// Strategy parameter overrides given on the command line.
    pub fn overrides(&self) -> StrategyOverrides {
        StrategyOverrides {
            priority_first: self.priority.clone(),
            exclude: self.exclude.clone(),
            category_order: self.category_order.clone(),
            custom_order: self.custom_order.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackupAction {
    /// List backups of both targets
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Restore a backup over its target
    Restore {
        /// Target to restore
        #[arg(long, value_enum)]
        target: KindArg,

        /// Backup number (defaults to the latest)
        #[arg(long)]
        number: Option<u32>,

        #[command(flatten)]
        paths: PathArgs,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArg {
    Global,
    Local,
    Both,
}

impl From<TargetArg> for TargetSelection {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Global => Self::Global,
            TargetArg::Local => Self::Local,
            TargetArg::Both => Self::Both,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Global,
    Local,
}

impl From<KindArg> for TargetKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Global => Self::Global,
            KindArg::Local => Self::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn sync_args(args: &[&str]) -> SyncArgs {
        let mut argv = vec!["modesync", "sync"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Some(Commands::Sync(args)) => args,
            other => panic!("expected sync, got {:?}", other),
        }
    }

    #[test]
    fn verify_cli() {
        // Verify the CLI is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["modesync"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["modesync", "sync", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_sync_defaults() {
        let args = sync_args(&[]);
        assert!(!args.dry_run);
        assert!(args.target.is_none());
        assert_eq!(args.level(), None);
    }

    #[test]
    fn parse_sync_full() {
        let args = sync_args(&[
            "--dry-run",
            "--strategy",
            "groupings",
            "--target",
            "both",
            "--strict",
            "--json",
            "--no-backup",
            "--modes-dir",
            "team",
        ]);
        assert!(args.dry_run);
        assert_eq!(args.strategy.as_deref(), Some("groupings"));
        assert_eq!(args.target, Some(TargetArg::Both));
        assert_eq!(args.level(), Some(ValidationLevel::Strict));
        assert!(args.json);
        assert!(args.no_backup);
        assert_eq!(args.modes_dir, Some(PathBuf::from("team")));
    }

    #[test]
    fn parse_strategy_overrides() {
        let args = sync_args(&[
            "--strategy",
            "custom",
            "--priority",
            "code,debug",
            "-e",
            "old-mode",
            "--custom-order",
            "ask,code",
            "--category-order",
            "core,specialized",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.priority_first, Some(vec!["code".to_string(), "debug".to_string()]));
        assert_eq!(overrides.exclude, Some(vec!["old-mode".to_string()]));
        assert_eq!(overrides.custom_order, Some(vec!["ask".to_string(), "code".to_string()]));
        assert_eq!(
            overrides.category_order,
            Some(vec!["core".to_string(), "specialized".to_string()])
        );
        assert!(sync_args(&[]).overrides().is_empty());
    }

    #[test]
    fn strict_conflicts_with_permissive() {
        let result = Cli::try_parse_from(["modesync", "sync", "--strict", "--permissive"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_modes_are_mutually_exclusive() {
        for pair in [
            ["--dry-run", "--validate-only"],
            ["--dry-run", "--list-modes"],
            ["--validate-only", "--list-modes"],
        ] {
            let mut argv = vec!["modesync", "sync"];
            argv.extend(pair);
            assert!(Cli::try_parse_from(argv).is_err(), "{:?} should conflict", pair);
        }
    }

    #[test]
    fn parse_backup_restore() {
        let cli = Cli::parse_from(["modesync", "backup", "restore", "--target", "local", "--number", "2"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Backup {
                action: BackupAction::Restore {
                    target: KindArg::Local,
                    number: Some(2),
                    ..
                }
            })
        ));
    }

    #[test]
    fn parse_completions_command() {
        let cli = Cli::parse_from(["modesync", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }
}
