//! bestiary - Creature reference data from the command line

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use bestiary_core::models::{parse_seed_file, CreaturePatch, NewCreature, PageRequest};
use bestiary_core::{
    BestiaryConfig, CreatureService, EtlClient, EtlRange, ResultCache, SqliteStore,
};
use clap::{Parser, Subcommand};
use cli::OutputStyle;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "bestiary",
    version,
    about = "Query and manage creature reference data",
    long_about = "Paginated, cached queries over creature reference data stored in SQLite.\n\
                  \n\
                  Examples:\n\
                    bestiary list --limit 10 --offset 20     # Second page of ten\n\
                    bestiary list --category fire            # Filter by category\n\
                    bestiary get 25                          # One creature with relations\n\
                    bestiary seed creatures.json             # Load seed records\n\
                    bestiary trigger-etl --end-id 151        # Ask the ETL service to load ids 1-151\n\
                  \n\
                  Environment Variables:\n\
                    BESTIARY_CONFIG                          # Config file path\n\
                    BESTIARY_DB                              # SQLite database path\n\
                    BESTIARY_ETL_URL                         # ETL service base URL\n\
                    RUST_LOG                                 # Log filter (default: warn)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Config file (default: ~/.config/bestiary/config.toml)
    #[arg(long, global = true, env = "BESTIARY_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path, or :memory:
    #[arg(long, global = true, env = "BESTIARY_DB")]
    db: Option<PathBuf>,

    /// ETL service base URL
    #[arg(long, global = true, env = "BESTIARY_ETL_URL")]
    etl_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "BESTIARY_NO_COLOR")]
    no_color: bool,

    /// Read straight from the store, bypassing the result cache
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Mode {
    #[command(flatten)]
    Query(QueryCommand),
    /// Load a JSON array of seed records
    Seed { file: PathBuf },
    /// Ask the ETL service to load a range of creature ids
    TriggerEtl {
        #[arg(long, default_value_t = 1)]
        start_id: i64,
        #[arg(long, default_value_t = 20)]
        end_id: i64,
    },
}

/// Commands served through the cached service facade
#[derive(Subcommand)]
enum QueryCommand {
    /// Show one creature with categories, traits and metrics
    Get { id: i64 },
    /// List creatures one page at a time
    List {
        /// Page size
        #[arg(long, short = 'n')]
        limit: Option<u32>,
        /// Rows to skip
        #[arg(long, short = 'o')]
        offset: Option<u32>,
        /// Exact category name
        #[arg(long, short = 'c')]
        category: Option<String>,
    },
    /// List every creature in a category
    ByCategory { name: String },
    /// Insert a creature
    Create {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        height: i32,
        #[arg(long)]
        weight: i32,
        #[arg(long)]
        base_experience: i32,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        is_default: bool,
    },
    /// Change some fields of a creature
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        height: Option<i32>,
        #[arg(long)]
        weight: Option<i32>,
        #[arg(long)]
        base_experience: Option<i32>,
        #[arg(long)]
        is_default: Option<bool>,
    },
    /// Delete a creature and its metrics
    Delete { id: i64 },
    /// List categories
    Categories,
    /// List traits
    Traits,
    /// Show metrics owned by a creature
    Metrics { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    let config = resolve_config(&cli)?;
    let style = OutputStyle {
        json: cli.json,
        no_color: cli.no_color,
    };

    match cli.mode {
        Mode::TriggerEtl { start_id, end_id } => {
            run_trigger_etl(&config, start_id, end_id, style).await
        }
        Mode::Seed { file } => run_seed(&open_store(&config)?, file),
        Mode::Query(command) => {
            let cache = if cli.no_cache {
                ResultCache::disabled()
            } else {
                ResultCache::from_config(&config.cache)
            };
            let service =
                CreatureService::new(Arc::new(open_store(&config)?), cache.clone(), &config.cache);

            let output = run_query(&service, command, style).await;

            let stats = cache.stats().await;
            debug!("{}", cli::format_cache_stats(&stats));
            cache.shutdown().await;

            println!("{}", output?);
            Ok(())
        }
    }
}

/// Defaults, then the config file, then flags and environment
fn resolve_config(cli: &Cli) -> Result<BestiaryConfig> {
    let mut config = BestiaryConfig::load(cli.config.as_deref())?;

    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    if let Some(url) = &cli.etl_url {
        config.etl.base_url = url.clone();
    }

    Ok(config)
}

fn open_store(config: &BestiaryConfig) -> Result<SqliteStore> {
    SqliteStore::from_config(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))
}

async fn run_query(
    service: &CreatureService,
    command: QueryCommand,
    style: OutputStyle,
) -> Result<String> {
    match command {
        QueryCommand::Get { id } => run_get(service, id, style).await,
        QueryCommand::List {
            limit,
            offset,
            category,
        } => {
            let request = PageRequest {
                limit,
                offset,
                category,
            };
            run_list(service, request, style).await
        }
        QueryCommand::ByCategory { name } => {
            let creatures = service.get_by_category(&name).await?;
            Ok(cli::format_creature_list(&creatures, style))
        }
        QueryCommand::Create {
            id,
            name,
            height,
            weight,
            base_experience,
            is_default,
        } => {
            let fields = NewCreature {
                id,
                name,
                height,
                weight,
                base_experience,
                is_default,
            };
            let created = service
                .create(fields)
                .await
                .with_context(|| format!("Failed to create creature {}", id))?;
            Ok(cli::format_creature_info(&created, style))
        }
        QueryCommand::Update {
            id,
            name,
            height,
            weight,
            base_experience,
            is_default,
        } => {
            let patch = CreaturePatch {
                name,
                height,
                weight,
                base_experience,
                is_default,
            };
            run_update(service, id, patch, style).await
        }
        QueryCommand::Delete { id } => run_delete(service, id).await,
        QueryCommand::Categories => Ok(cli::format_categories(&service.categories().await?, style)),
        QueryCommand::Traits => Ok(cli::format_traits(&service.traits().await?, style)),
        QueryCommand::Metrics { id } => {
            Ok(cli::format_metrics(&service.metrics_for(id).await?, style))
        }
    }
}

async fn run_get(service: &CreatureService, id: i64, style: OutputStyle) -> Result<String> {
    match service.get_by_id(id).await? {
        Some(creature) => Ok(cli::format_creature_info(&creature, style)),
        None => bail!("Creature {} not found", id),
    }
}

async fn run_list(
    service: &CreatureService,
    request: PageRequest,
    style: OutputStyle,
) -> Result<String> {
    let offset = request.offset();
    let page = service
        .paginated(request)
        .await
        .context("Failed to list creatures")?;
    Ok(cli::format_creature_page(&page, offset, style))
}

async fn run_update(
    service: &CreatureService,
    id: i64,
    patch: CreaturePatch,
    style: OutputStyle,
) -> Result<String> {
    if patch.is_empty() {
        bail!("Nothing to update: pass at least one field");
    }

    match service
        .update(id, patch)
        .await
        .with_context(|| format!("Failed to update creature {}", id))?
    {
        Some(creature) => Ok(cli::format_creature_info(&creature, style)),
        None => bail!("Creature {} not found", id),
    }
}

async fn run_delete(service: &CreatureService, id: i64) -> Result<String> {
    if service.delete(id).await? {
        Ok(format!("Deleted creature {}", id))
    } else {
        bail!("Creature {} not found", id)
    }
}

fn run_seed(store: &SqliteStore, file: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read seed file {}", file.display()))?;
    let records = parse_seed_file(&content)
        .with_context(|| format!("Invalid seed file {}", file.display()))?;

    let report = store.import_all(&records);
    println!("{}", cli::format_import_report(&report));

    if report.loaded == 0 && report.failed > 0 {
        bail!("No records imported");
    }
    Ok(())
}

async fn run_trigger_etl(
    config: &BestiaryConfig,
    start_id: i64,
    end_id: i64,
    style: OutputStyle,
) -> Result<()> {
    let range = EtlRange::new(start_id, end_id)?;
    let client = EtlClient::new(&config.etl)?;

    let outcome = client.trigger(range).await;
    println!("{}", cli::format_etl_outcome(&outcome, style));

    if !outcome.success {
        bail!("ETL trigger failed");
    }
    Ok(())
}
