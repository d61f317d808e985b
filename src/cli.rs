use std::{path::PathBuf, str::FromStr};

mod add;
mod mark_listed;
mod move_value;
mod propagate;
mod remove;
mod rename;
mod terminal;
mod validate;

use add::{AddFeature, AddValue};
use clap::ArgAction;
use curator::{Database, Language};
use mark_listed::MarkListed;
use move_value::MoveValue;
use propagate::Propagate;
use remove::{RemoveFeature, RemoveValue};
use rename::{RenameFeature, RenameValue};
use terminal::Colorize;
use validate::Validate;

/// Parse an id, normalizing to uppercase.
///
/// Ids are ASCII, so `a-3-2` names the same value as `A-3-2`.
fn parse_id<T>(s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    s.trim().to_uppercase().parse().map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The root of the feature database
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Add a feature, with its listed values, to a category
    AddFeature(AddFeature),

    /// Add a listed value to a feature
    AddValue(AddValue),

    /// Remove a feature, its listed values and its profile rows
    RemoveFeature(RemoveFeature),

    /// Remove a listed value
    ///
    /// Profiles that selected it keep their answer as a custom value.
    RemoveValue(RemoveValue),

    /// Move a listed value to another index within its feature
    MoveValue(MoveValue),

    /// Rename a feature
    RenameFeature(RenameFeature),

    /// Rename a listed value
    RenameValue(RenameValue),

    /// Mark one doculect's custom answer as a listed value
    MarkListed(MarkListed),

    /// Switch features to not_applicable where a trigger value is selected
    Propagate(Propagate),

    /// Check every store for inconsistencies
    Validate(Validate),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::AddFeature(command) => command.run(root)?,
            Self::AddValue(command) => command.run(root)?,
            Self::RemoveFeature(command) => command.run(root)?,
            Self::RemoveValue(command) => command.run(root)?,
            Self::MoveValue(command) => command.run(root)?,
            Self::RenameFeature(command) => command.run(root)?,
            Self::RenameValue(command) => command.run(root)?,
            Self::MarkListed(command) => command.run(root)?,
            Self::Propagate(command) => command.run(root)?,
            Self::Validate(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Which name to rename.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Lang {
    /// The English name
    En,
    /// The Russian name, also held by every profile
    Ru,
}

impl From<Lang> for Language {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::En => Self::En,
            Lang::Ru => Self::Ru,
        }
    }
}

/// Asks before a destructive change. Returns `false` if the user declined.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Writes every touched store and reports what was written.
fn flush(database: &mut Database) -> anyhow::Result<()> {
    let written = database.flush()?;
    let root = database.root().to_path_buf();
    for path in &written {
        let shown = path.strip_prefix(&root).unwrap_or(path);
        println!("{}", format!("   wrote {}", shown.display()).dim());
    }
    Ok(())
}
