use clap::{Parser, Subcommand};
use drjira_core::{
    config::resolve_data_dir, CoreConfig, DisabledGateway, FileStore, IssueKey, KeyValueStore,
    MarkdownService, MemoryStore, SuggestionService, SuggestionStore,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "drjira")]
#[command(about = "Dr. Jira suggestion service CLI")]
struct Cli {
    /// Data directory (defaults to DRJIRA_DATA_DIR, then ./drjira_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert text to a structured document and print it as JSON
    Convert {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Store the suggestions of a webhook payload file
    Ingest {
        /// Payload file, in any framing the webhook accepts
        file: PathBuf,
        /// Parse and report without writing to the data directory
        #[arg(long)]
        dry_run: bool,
    },
    /// List the suggestions stored for an issue
    List {
        /// Issue key, e.g. GS-64
        key: String,
    },
    /// Show how many suggestions were applied per model
    Stats,
    /// Browse stored entries
    Storage {
        /// Last key of the previous page
        #[arg(long)]
        cursor: Option<String>,
        /// Page size (1-100)
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn open_service(
    data_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<SuggestionService, Box<dyn std::error::Error>> {
    let data_dir = data_dir
        .unwrap_or_else(|| resolve_data_dir(std::env::var("DRJIRA_DATA_DIR").ok()));
    let cfg = CoreConfig::new(data_dir, None, None, None, None)?;
    let raw: Arc<dyn KeyValueStore> = if dry_run {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(cfg.data_dir())?)
    };
    Ok(SuggestionService::new(
        Arc::new(cfg),
        SuggestionStore::new(raw),
        Arc::new(DisabledGateway),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert { file }) => {
            let text = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let blocks = MarkdownService::new().convert(&text);
            let document = adf::to_value(&adf::Document::new(blocks))?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Some(Commands::Ingest { file, dry_run }) => {
            let service = open_service(cli.data_dir, dry_run)?;
            let raw = std::fs::read_to_string(file)?;
            match service.ingest_webhook(&raw) {
                Ok(ingested) => {
                    let verb = if dry_run { "Parsed" } else { "Stored" };
                    println!(
                        "{} {} suggestion(s) for issue {}",
                        verb,
                        ingested.suggestions.len(),
                        ingested.issue_key
                    );
                    for s in ingested.suggestions {
                        println!("  {} [{}] {}", s.id, s.source_model, s.title);
                    }
                }
                Err(e) => eprintln!("Error ingesting payload: {}", e),
            }
        }
        Some(Commands::List { key }) => {
            let service = open_service(cli.data_dir, false)?;
            let key = IssueKey::new(&key)?;
            let suggestions = service.list_suggestions(&key)?;
            if suggestions.is_empty() {
                println!("No suggestions found.");
            } else {
                for s in suggestions {
                    let score = s
                        .score
                        .value()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "?".into());
                    println!(
                        "ID: {}, Title: {}, Model: {}, Score: {}",
                        s.id, s.title, s.source_model, score
                    );
                }
            }
        }
        Some(Commands::Stats) => {
            let service = open_service(cli.data_dir, false)?;
            let stats = service.usage_stats()?;
            if stats.is_empty() {
                println!("No suggestions applied yet.");
            } else {
                for (model, count) in stats.iter() {
                    println!("{}: {}", model, count);
                }
            }
        }
        Some(Commands::Storage { cursor, limit }) => {
            let service = open_service(cli.data_dir, false)?;
            let page = service.storage_page(cursor.as_deref(), limit)?;
            for entry in &page.results {
                println!("{} = {}", entry.key, entry.value);
            }
            if let Some(next) = page.next_cursor {
                println!("-- more: --cursor {}", next);
            }
        }
        None => {
            println!("Use --help for usage");
        }
    }

    Ok(())
}
