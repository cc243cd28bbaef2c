//! Command-line interface definitions and parsing
//!
//! This module defines the complete CLI structure for fanout using the `clap` crate.
//!
//! # Commands
//!
//! - **scan**: Find images in the working folder and list them with their tags
//! - **tags**: Manage the folder's tags (list, show, add, remove)
//! - **tag** / **untag** / **toggle** / **done**: Edit one item
//! - **hash**: Fingerprint an item and recall tags from identical content
//! - **target**: Show or set the folder's publish target
//! - **publish**: Copy tagged items into `target/<tag>/`
//! - **config**: Read and write user settings
//!
//! Every command except `config` works on one working folder, given with
//! `-w/--working` or defaulting to the last one used, then the current
//! directory.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::FanoutError;
use crate::config::FanoutConfig;

/// Configuration management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key=value (e.g., quiet=true)
        #[arg(value_name = "KEY=VALUE")]
        setting: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key to retrieve (e.g., quiet)
        #[arg(value_name = "KEY")]
        key: String,
    },
}

/// Tag management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TagsCommands {
    /// List all tags with their usage
    #[command(visible_alias = "ls")]
    List {
        /// Only tags whose name contains this text (case-insensitive)
        #[arg(short = 'f', long = "filter", value_name = "TEXT")]
        filter: Option<String>,
    },

    /// List the files carrying a tag
    Show {
        /// Tag to show
        tag: String,
    },

    /// Create one or more tags
    Add {
        /// Tag names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Delete a tag and remove it from every item
    #[command(visible_alias = "rm")]
    Remove {
        /// Tag to delete
        tag: String,
    },
}

/// How an existing target is treated by publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Ask if the target already has folders
    Ask,
    /// Keep what is there and add to it
    Merge,
    /// Empty the target first
    Drop,
}

impl PublishMode {
    /// Mode selected by `--drop` / `--merge`
    #[must_use]
    pub const fn from_flags(drop: bool, merge: bool) -> Self {
        match (drop, merge) {
            (true, _) => Self::Drop,
            (false, true) => Self::Merge,
            (false, false) => Self::Ask,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(about = "Tag image files and publish them into per-tag folders", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Show debug logging on stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Working folder (defaults to the last one used, then the current directory)
    #[arg(short = 'w', long = "working", value_name = "DIR", global = true)]
    pub working: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scan the working folder for images and list them
    #[command(visible_alias = "s")]
    Scan {
        /// Also list items marked done
        #[arg(short = 'a', long = "all")]
        all: bool,

        /// Remember whether done items are listed for this folder
        #[arg(long = "show-done", value_name = "BOOL")]
        show_done: Option<bool>,

        /// Only files whose path contains this text (case-insensitive)
        #[arg(short = 'f', long = "filter", value_name = "TEXT")]
        filter: Option<String>,
    },

    /// Manage tags
    Tags {
        #[command(subcommand)]
        command: TagsCommands,
    },

    /// Add tags to a file (tags are created as needed)
    #[command(visible_alias = "t")]
    Tag {
        /// File inside the working folder
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tags to add
        #[arg(value_name = "TAGS", required = true)]
        tags: Vec<String>,
    },

    /// Remove tags from a file
    #[command(visible_alias = "u")]
    Untag {
        /// File inside the working folder
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tags to remove
        #[arg(value_name = "TAGS", required = true)]
        tags: Vec<String>,
    },

    /// Flip one tag on a file
    Toggle {
        /// File inside the working folder
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tag to flip
        #[arg(value_name = "TAG")]
        tag: String,
    },

    /// Mark a file as done
    Done {
        /// File inside the working folder
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Clear the done flag instead
        #[arg(long = "undo")]
        undo: bool,
    },

    /// Fingerprint a file and copy tags over from identical files
    Hash {
        /// File inside the working folder
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show or set the publish target of the working folder
    Target {
        /// New target folder
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// Copy every tagged file into <target>/<tag>/
    #[command(visible_alias = "p")]
    Publish {
        /// Target folder (saved as the folder's target)
        #[arg(value_name = "TARGET")]
        target: Option<PathBuf>,

        /// Empty the target before publishing
        #[arg(long = "drop", conflicts_with = "merge")]
        drop: bool,

        /// Add to the target without emptying it
        #[arg(long = "merge")]
        merge: bool,

        /// Print one JSON object per event
        #[arg(long = "json")]
        json: bool,

        /// Also write the trail log to this file
        #[arg(long = "log", value_name = "FILE")]
        log: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolve the working folder: `--working`, then the last used folder
    /// if it still exists, then the current directory
    ///
    /// # Errors
    ///
    /// Returns `FanoutError::InvalidInput` if the folder does not exist and
    /// `FanoutError::Io` if the current directory cannot be read.
    pub fn working_folder(&self, config: &FanoutConfig) -> Result<PathBuf, FanoutError> {
        let folder = match (&self.working, &config.last_folder) {
            (Some(explicit), _) => explicit.clone(),
            (None, Some(last)) if last.is_dir() => last.clone(),
            _ => std::env::current_dir()?,
        };
        folder
            .canonicalize()
            .map_err(|e| FanoutError::InvalidInput(format!("Cannot open folder '{}': {e}", folder.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    fn mode_of(cli: &Cli) -> PublishMode {
        match cli.command {
            Commands::Publish { drop, merge, .. } => PublishMode::from_flags(drop, merge),
            _ => panic!("not a publish command"),
        }
    }

    #[test]
    fn test_parse_publish_flags() {
        let cli = Cli::parse_from(["fanout", "-q", "publish", "/out", "--drop"]);
        assert!(cli.quiet);
        assert_eq!(mode_of(&cli), PublishMode::Drop);

        let cli = Cli::parse_from(["fanout", "p", "--merge"]);
        assert_eq!(mode_of(&cli), PublishMode::Merge);

        let cli = Cli::parse_from(["fanout", "publish", "--json"]);
        assert_eq!(mode_of(&cli), PublishMode::Ask);

        assert!(Cli::try_parse_from(["fanout", "publish", "--drop", "--merge"]).is_err());
    }

    #[test]
    fn test_parse_tag_requires_tags() {
        assert!(Cli::try_parse_from(["fanout", "tag", "a.jpg"]).is_err());
        let cli = Cli::parse_from(["fanout", "-w", "/photos", "t", "a.jpg", "cat", "sofa"]);
        assert_eq!(cli.working, Some(PathBuf::from("/photos")));
        match cli.command {
            Commands::Tag { file, tags } => {
                assert_eq!(file, PathBuf::from("a.jpg"));
                assert_eq!(tags, vec!["cat", "sofa"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_tags_subcommands() {
        let cli = Cli::parse_from(["fanout", "tags", "rm", "cat"]);
        assert!(matches!(
            cli.command,
            Commands::Tags {
                command: TagsCommands::Remove { .. }
            }
        ));

        let cli = Cli::parse_from(["fanout", "tags", "ls", "-f", "bea"]);
        match cli.command {
            Commands::Tags {
                command: TagsCommands::List { filter },
            } => assert_eq!(filter.as_deref(), Some("bea")),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["fanout", "tags", "show", "Holiday"]);
        assert!(matches!(
            cli.command,
            Commands::Tags {
                command: TagsCommands::Show { ref tag }
            } if tag == "Holiday"
        ));
    }

    #[test]
    fn test_parse_scan_filter_and_publish_log() {
        let cli = Cli::parse_from(["fanout", "scan", "--filter", "2023/"]);
        assert!(matches!(cli.command, Commands::Scan { ref filter, .. } if filter.as_deref() == Some("2023/")));

        let cli = Cli::parse_from(["fanout", "publish", "/out", "--log", "run.log"]);
        assert!(matches!(
            cli.command,
            Commands::Publish { ref log, .. } if log.as_deref() == Some(std::path::Path::new("run.log"))
        ));
    }

    #[test]
    fn test_working_folder_prefers_flag() {
        let tree = crate::testing::TestTree::new();
        let explicit = tree.dir("explicit");
        let last = tree.dir("last");
        let config = FanoutConfig {
            last_folder: Some(last.clone()),
            ..FanoutConfig::default()
        };

        let cli = Cli::parse_from(["fanout", "-w", explicit.to_str().unwrap(), "scan"]);
        assert_eq!(cli.working_folder(&config).unwrap(), explicit.canonicalize().unwrap());

        let cli = Cli::parse_from(["fanout", "scan"]);
        assert_eq!(cli.working_folder(&config).unwrap(), last.canonicalize().unwrap());

        let cli = Cli::parse_from(["fanout", "-w", "/definitely/not/here", "scan"]);
        assert!(matches!(cli.working_folder(&config), Err(FanoutError::InvalidInput(_))));
    }
}
