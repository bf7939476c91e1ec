use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use revert_decoder::config::{self, Backend, Config};
use revert_decoder::{AbiScanner, ErrorDecoder, ShardWriter, SqliteShardStore};

#[derive(Debug, Parser)]
#[command(
    name = "revert-decoder",
    version,
    about = "Decode smart-contract revert data against a sharded error signature database"
)]
struct Args {
    /// Signature database: shard directory, or SQLite file with --sqlite
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Selector hex characters used to pick a shard
    #[arg(long, global = true)]
    prefix_length: Option<usize>,

    /// Use the SQLite backend at --db
    #[arg(long, global = true)]
    sqlite: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode hex revert data
    Decode {
        /// Revert data, e.g. 0xdb42144d...
        data: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add the errors of ABI files (or directories of them) to the database
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Create empty shard files for every prefix
    Init,
    /// Copy the shard directory into a SQLite database
    ImportSqlite {
        /// SQLite file to create or update
        target: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config_from_args(&args, config::load());
    let db_path = config.database_path();
    tracing::debug!(db = %db_path.display(), backend = ?config.database.backend, "using signature database");

    match args.command {
        Command::Decode { data, json } => decode(&config, &data, json).await,
        Command::Add { paths } => add(&config, &paths),
        Command::Init => {
            if config.database.backend == Backend::Sqlite {
                SqliteShardStore::open(&db_path)
                    .with_context(|| format!("open db {}", db_path.display()))?;
                println!("Initialized {}", db_path.display());
                return Ok(());
            }
            let created = ShardWriter::new(&db_path, config.database.prefix_length)?.init()?;
            println!("Created {} shard files in {}", created, db_path.display());
            Ok(())
        }
        Command::ImportSqlite { target } => {
            let store = SqliteShardStore::open(&target)
                .with_context(|| format!("open db {}", target.display()))?;
            let inserted = store.import_dir(&db_path)?;
            let (selectors, signatures) = store.stats()?;
            println!(
                "Imported {} signatures into {} ({} selectors, {} signatures total)",
                inserted,
                target.display(),
                selectors,
                signatures
            );
            Ok(())
        }
    }
}

fn config_from_args(args: &Args, mut config: Config) -> Config {
    if let Some(db) = &args.db {
        config.database.path = Some(db.clone());
    }
    if let Some(prefix_length) = args.prefix_length {
        config.database.prefix_length = prefix_length;
    }
    if args.sqlite {
        config.database.backend = Backend::Sqlite;
    }
    config
}

async fn decode(config: &Config, data: &str, json: bool) -> Result<()> {
    let options = config.decoder_options();
    let decoder = match config.database.backend {
        Backend::Files => ErrorDecoder::new(&options)?,
        Backend::Sqlite => {
            let store = SqliteShardStore::open(&options.path)
                .with_context(|| format!("open db {}", options.path.display()))?;
            ErrorDecoder::with_store(Arc::new(store), &options)?
        }
    };

    let results = decoder.decode_hex(data).await.context("decode failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (idx, result) in results.iter().enumerate() {
        println!("{}. {}", idx + 1, result);
    }
    Ok(())
}

fn add(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let report = AbiScanner::scan_roots(paths)?;
    for failure in &report.failures {
        tracing::warn!("{}", failure);
    }
    if report.errors.is_empty() {
        bail!("No errors found in ABI");
    }

    let db_path = config.database_path();
    if config.database.backend == Backend::Sqlite {
        let store = SqliteShardStore::open(&db_path)
            .with_context(|| format!("open db {}", db_path.display()))?;
        let mut added = 0;
        for error in &report.errors {
            if store.save_signature(&error.selector.to_string(), &error.signature)? {
                added += 1;
            } else {
                tracing::warn!("{} already exists", error.signature);
            }
        }
        println!("Added {} of {} signatures to {}", added, report.errors.len(), db_path.display());
        return Ok(());
    }

    let writer = ShardWriter::new(&db_path, config.database.prefix_length)?;
    let report = writer.add(&report.errors)?;
    for path in &report.written {
        println!("Wrote {}", path.display());
    }
    println!(
        "{} inserted, {} appended, {} already present",
        report.inserted, report.appended, report.duplicates
    );
    Ok(())
}
