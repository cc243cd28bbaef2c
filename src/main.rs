//! Fanout CLI application entry point
//!
//! Tags the images of a working folder and publishes them into one folder per
//! tag.
//!
//! # Usage
//!
//! ```bash
//! # Find images and list them with their tags
//! fanout -w ~/Pictures scan
//!
//! # Tag a file (tags are created on first use)
//! fanout tag 2023/beach.jpg holiday sea
//!
//! # Recognize a copy of an already tagged file
//! fanout hash downloads/beach-copy.jpg
//!
//! # Publish into ~/Export/<tag>/, emptying it first
//! fanout publish ~/Export --drop
//!
//! # Quiet mode (only output results)
//! fanout -q tags list
//! ```
//!
//! # Configuration
//!
//! User settings live in the user's config directory
//! (`~/.config/fanout/config.toml` on Linux). Each working folder keeps its
//! tags and publish target in its own `.fanout-db` directory.

use fanout::{
    FanoutError,
    cli::{Cli, Commands, PublishMode},
    commands::{self, publish::PublishArgs},
    config::FanoutConfig,
    db::Database,
    logging,
};
use std::path::PathBuf;
use std::sync::Arc;

type Result<T> = std::result::Result<T, FanoutError>;

/// Open working folder and its database
struct Session {
    working: PathBuf,
    db: Arc<Database>,
}

impl Session {
    fn open(cli: &Cli, config: &mut FanoutConfig) -> Result<Self> {
        let working = cli.working_folder(config)?;
        let db = Arc::new(Database::open_in(&working)?);

        if config.last_folder.as_ref() != Some(&working) {
            config.last_folder = Some(working.clone());
            config.save()?;
        }
        Ok(Self { working, db })
    }

    fn close(self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    let mut config = FanoutConfig::load()?;
    let quiet = cli.quiet || config.quiet;

    match &cli.command {
        Commands::Config { command } => commands::config(&mut config, command, quiet),
        Commands::Scan { all, show_done, filter } => {
            let s = Session::open(&cli, &mut config)?;
            commands::scan(&s.db, &s.working, &config, *all, *show_done, filter.as_deref(), quiet)?;
            s.close()
        }
        Commands::Tags { command } => {
            let s = Session::open(&cli, &mut config)?;
            commands::tags(&s.db, command, quiet)?;
            s.close()
        }
        Commands::Tag { file, tags } => {
            let s = Session::open(&cli, &mut config)?;
            commands::tag(&s.db, &s.working, file, tags, quiet)?;
            s.close()
        }
        Commands::Untag { file, tags } => {
            let s = Session::open(&cli, &mut config)?;
            commands::tag::untag(&s.db, &s.working, file, tags, quiet)?;
            s.close()
        }
        Commands::Toggle { file, tag } => {
            let s = Session::open(&cli, &mut config)?;
            commands::tag::toggle(&s.db, &s.working, file, tag, quiet)?;
            s.close()
        }
        Commands::Done { file, undo } => {
            let s = Session::open(&cli, &mut config)?;
            commands::tag::done(&s.db, &s.working, file, *undo, quiet)?;
            s.close()
        }
        Commands::Hash { file } => {
            let s = Session::open(&cli, &mut config)?;
            commands::hash(&s.db, &s.working, file, &config, quiet)?;
            s.close()
        }
        Commands::Target { path } => {
            let s = Session::open(&cli, &mut config)?;
            commands::target(&s.db, path.as_deref(), quiet)?;
            s.close()
        }
        Commands::Publish {
            target,
            drop,
            merge,
            json,
            log,
        } => {
            let s = Session::open(&cli, &mut config)?;
            let args = PublishArgs {
                target: target.as_deref(),
                mode: PublishMode::from_flags(*drop, *merge),
                json: *json,
                log: log.as_deref(),
            };
            commands::publish(&s.db, &s.working, &args, &config, quiet)?;
            s.close()
        }
    }
}
