//! notestore CLI
//!
//! Command-line front end over the note service.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use notestore::config::Backend;
use notestore::note::{sort_notes, SortBy};
use notestore::{codec, store, Config, Context, Note, NoteService, Result, Store};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// notestore CLI
#[derive(Parser, Debug)]
#[command(name = "notestore")]
#[command(about = "Embedded note store")]
#[command(version)]
struct Args {
    /// Data directory (overrides the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Config file (default: search /etc/noteapp, ~/.noteapp, .)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the volatile backend regardless of the config
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a note
    Create {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'b', long)]
        content: Option<String>,

        /// Mark the note as a favorite
        #[arg(short, long)]
        favorite: bool,

        /// Use this id instead of a generated one
        #[arg(long)]
        id: Option<Uuid>,
    },

    /// Print a note
    Get {
        id: Uuid,
    },

    /// Update the given fields of a note
    Update {
        id: Uuid,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'b', long)]
        content: Option<String>,

        /// Set or clear the favorite flag
        #[arg(short, long)]
        favorite: Option<bool>,
    },

    /// Delete a note
    Delete {
        id: Uuid,
    },

    /// Print every note in the snapshot file
    List {
        #[arg(short, long, value_enum, default_value = "id")]
        sort: SortArg,

        /// Descending order
        #[arg(long)]
        desc: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Id,
    Title,
    Created,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Id => SortBy::Id,
            SortArg::Title => SortBy::Title,
            SortArg::Created => SortBy::CreatedTime,
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,notestore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_yaml_file(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if args.memory {
        config.backend = Backend::Memory;
    }

    tracing::debug!(data_dir = %config.data_dir.display(), backend = ?config.backend, "using config");
    if config.backend == Backend::Memory {
        tracing::warn!("memory backend selected; changes are lost when the command exits");
    }

    let ctx = Context::background();

    match args.command {
        Commands::Create {
            title,
            content,
            favorite,
            id,
        } => {
            let note = Note {
                id: id.unwrap_or_else(Uuid::nil),
                title,
                content,
                is_favorite: favorite.then_some(true),
                ..Note::default()
            };
            print_note(&open_service(&config)?.create(&ctx, &note)?)
        }
        Commands::Get { id } => print_note(&open_service(&config)?.get(&ctx, id)?),
        Commands::Update {
            id,
            title,
            content,
            favorite,
        } => {
            let patch = Note {
                id,
                title,
                content,
                is_favorite: favorite,
                ..Note::default()
            };
            print_note(&open_service(&config)?.update(&ctx, &patch)?)
        }
        Commands::Delete { id } => {
            open_service(&config)?.delete(&ctx, id)?;
            tracing::info!(%id, "deleted");
            Ok(())
        }
        Commands::List { sort, desc } => list(&config, sort.into(), !desc),
    }
}

fn open_service(config: &Config) -> Result<NoteService<Box<dyn Store>>> {
    Ok(NoteService::new(store::open(config)?))
}

/// Decode the snapshot file directly, bypassing the store
fn list(config: &Config, by: SortBy, ascend: bool) -> Result<()> {
    let path = config.notes_path();
    if !path.exists() {
        return Ok(());
    }

    let file = File::open(&path)?;
    let mut notes = codec::decode_all(BufReader::new(file)).collect::<Result<Vec<_>>>()?;
    sort_notes(&mut notes, by, ascend);

    for note in &notes {
        print_note(note)?;
    }
    Ok(())
}

fn print_note(note: &Note) -> Result<()> {
    let json = serde_json::to_string(note).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_favorite_is_a_flag() {
        let args = Args::try_parse_from(["notestore", "create", "--title", "t", "--favorite"]).unwrap();
        match args.command {
            Commands::Create { favorite, title, .. } => {
                assert!(favorite);
                assert_eq!(title.as_deref(), Some("t"));
            }
            other => panic!("expected create, got {:?}", other),
        }

        let args = Args::try_parse_from(["notestore", "create"]).unwrap();
        assert!(matches!(args.command, Commands::Create { favorite: false, .. }));
    }

    #[test]
    fn test_update_favorite_takes_a_value() {
        let id = Uuid::new_v4().to_string();
        let args =
            Args::try_parse_from(["notestore", "update", id.as_str(), "--favorite", "false"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Update { favorite: Some(false), .. }
        ));

        let args = Args::try_parse_from(["notestore", "update", id.as_str()]).unwrap();
        assert!(matches!(args.command, Commands::Update { favorite: None, .. }));
    }

    #[test]
    fn test_memory_flag_parses() {
        let id = Uuid::new_v4().to_string();
        let args = Args::try_parse_from(["notestore", "--memory", "get", id.as_str()]).unwrap();
        assert!(args.memory);
    }
}
