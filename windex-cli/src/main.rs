//! windex CLI - index a directory tree into a catalog and search it

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use windex_core::config::default_config_path;
use windex_core::{Catalog, Config, ExclusionSet, Indexer, SearchEngine};

#[derive(Parser)]
#[command(name = "windex")]
#[command(about = "Incremental file catalog with fast substring search", long_about = None)]
struct Cli {
    /// Directory tree to index (default: /mnt/ when present, else the system drive)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Path substring to skip; repeatable, added to the built-in list
    #[arg(long, global = true, value_name = "SUBSTRING")]
    exclude: Vec<String>,

    /// Catalog database location (default: ~/.windex/.winindex.db)
    #[arg(long, global = true, env = "WINDEX_DB")]
    db: Option<PathBuf>,

    /// Config file (default: ~/.windex/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.toml
    Init,

    /// Walk the root and bring the catalog up to date
    Index,

    /// Find catalog entries whose name or path contains PATTERN (case-insensitive)
    Search {
        /// Substring to look for; "" lists the most recent entries
        pattern: String,
    },

    /// Show catalog stats
    Status,
}

/// Settings resolved from flags, config file and defaults
struct Settings {
    home: PathBuf,
    config_path: PathBuf,
    config: Config,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli);

    if let Err(e) = result {
        if cli.json {
            let error_json = serde_json::json!({ "code": "error", "message": e.to_string() });
            eprintln!("{}", error_json);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> windex_core::Result<()> {
    let settings = load_settings(cli)?;

    match &cli.command {
        Commands::Init => cmd_init(&settings, cli.json),
        Commands::Index => cmd_index(cli, &settings),
        Commands::Search { pattern } => cmd_search(cli, &settings, pattern),
        Commands::Status => cmd_status(cli, &settings),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn load_settings(cli: &Cli) -> windex_core::Result<Settings> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config = match &cli.config {
        // An explicit config must exist
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&default_config_path(&home))?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&home));

    Ok(Settings {
        home,
        config_path,
        config,
    })
}

fn open_catalog(cli: &Cli, settings: &Settings) -> windex_core::Result<Catalog> {
    let db_path = settings.config.catalog_path(&settings.home, cli.db.as_deref());
    tracing::debug!(path = %db_path.display(), "opening catalog");
    Catalog::open(&db_path)
}

fn cmd_init(settings: &Settings, json: bool) -> windex_core::Result<()> {
    use colored::Colorize;

    Config::write_default(&settings.config_path)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "created": settings.config_path.display().to_string() })
        );
    } else {
        println!("{} {}", "Created".green(), settings.config_path.display());
    }
    Ok(())
}

fn cmd_index(cli: &Cli, settings: &Settings) -> windex_core::Result<()> {
    use colored::Colorize;

    let root = settings.config.index_root(cli.root.as_deref());
    let exclusions = ExclusionSet::with_additions(
        settings
            .config
            .exclude
            .patterns
            .iter()
            .cloned()
            .chain(cli.exclude.iter().cloned()),
    );

    tracing::debug!(patterns = ?exclusions.patterns(), "exclusions");

    let mut catalog = open_catalog(cli, settings)?;
    let indexer = Indexer::new(exclusions);
    let stats = indexer.index(&mut catalog, &root)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}: {}", "Root".blue(), stats.root.display());
        println!(
            "{}: {} new, {} modified",
            "Indexed".green(),
            stats.inserted,
            stats.updated
        );
        println!(
            "{}: {} unchanged of {} seen",
            "Skipped".yellow(),
            stats.unchanged,
            stats.entries_seen
        );
        println!("{}: {} stale entries", "Removed".yellow(), stats.deleted);
        if !stats.errors.is_empty() {
            println!(
                "{}: {} entries could not be read (see warnings above)",
                "Errors".red(),
                stats.errors.len()
            );
        }
        println!(
            "{}: {} ({} ms)",
            "Catalog".blue(),
            display_db_path(&catalog),
            stats.elapsed_ms
        );
    }
    Ok(())
}

fn cmd_search(cli: &Cli, settings: &Settings, pattern: &str) -> windex_core::Result<()> {
    let catalog = open_catalog(cli, settings)?;
    let hits = SearchEngine::new(&catalog).search(pattern)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    for hit in &hits {
        println!("{}\n", hit.render());
    }
    println!("({} results)", hits.len());
    Ok(())
}

fn cmd_status(cli: &Cli, settings: &Settings) -> windex_core::Result<()> {
    use colored::Colorize;

    let catalog = open_catalog(cli, settings)?;
    let status = catalog.status()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "{}: {} ({:.1} MB)",
            "Catalog".blue(),
            display_db_path(&catalog),
            status.catalog_size_bytes as f64 / 1_000_000.0
        );
        println!(
            "{}: {} ({} files, {} directories)",
            "Entries".blue(),
            status.entries,
            status.files,
            status.directories
        );
        println!("{}: v{}", "Schema".blue(), status.schema_version);
        if let Some(newest) = status.newest_modified_at {
            let offset = windex_core::search::local_offset();
            println!(
                "{}: {}",
                "Newest entry".blue(),
                windex_core::search::format_timestamp(newest, offset)?
            );
        }
    }
    Ok(())
}

fn display_db_path(catalog: &Catalog) -> String {
    catalog
        .db_path()
        .map(Path::display)
        .map(|d| d.to_string())
        .unwrap_or_else(|| ":memory:".to_string())
}
