//! ftms CLI: load a corpus, then query, retract or explain.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use forward_tms::config::EngineConfig;
use forward_tms::error::{KbError, TmsError};
use forward_tms::kb::{Item, KnowledgeBase};
use forward_tms::loader;

#[derive(Parser)]
#[command(name = "ftms", version, about = "Forward-chaining rule engine with truth maintenance")]
struct Cli {
    /// Corpus file with one `fact:` or `rule:` per line.
    corpus: PathBuf,

    /// Engine config (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every stored fact and rule after forward chaining.
    Show,

    /// Ask a fact-shaped query, e.g. `fact: (color ?X red)`.
    Ask {
        query: String,
    },

    /// Retract an item and print what the cascade removed.
    Retract {
        item: String,

        /// Print the knowledge base afterwards.
        #[arg(long)]
        show: bool,
    },

    /// Explain why an item is believed.
    Why {
        item: String,

        /// Emit the explanation as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(TmsError::from)?,
        None => EngineConfig::default(),
    };

    let default_filter = match cli.verbose {
        0 => config.log_filter.clone(),
        1 => "forward_tms=debug".to_string(),
        _ => "forward_tms=trace".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let items = loader::load_file(&cli.corpus).map_err(TmsError::from)?;
    let mut kb = KnowledgeBase::new(config);
    let inserted = kb.load(items).map_err(TmsError::from)?;
    tracing::info!(
        inserted,
        facts = kb.fact_count(),
        rules = kb.rule_count(),
        "corpus asserted"
    );

    match cli.command {
        Commands::Show => {
            print!("{kb}");
        }

        Commands::Ask { query } => {
            let query = parse_arg(&query)?;
            let result = kb.ask(&query).map_err(TmsError::from)?;
            if result.is_empty() {
                println!("No answers.");
            } else {
                println!("{result}");
            }
        }

        Commands::Retract { item, show } => {
            let item = parse_arg(&item)?;
            let report = kb.retract(&item).map_err(TmsError::from)?;
            println!("{item}: {}", report.disposition);
            for key in &report.removed {
                println!("  removed {key}");
            }
            for key in &report.demoted {
                println!("  demoted {key}");
            }
            println!("  cascade depth: {}", report.cascade_depth);
            if show {
                print!("{kb}");
            }
        }

        Commands::Why { item, json } => {
            let item = parse_arg(&item)?;
            let explanation = kb
                .lookup(&item)
                .and_then(|key| kb.explain(key))
                .ok_or_else(|| {
                    TmsError::from(KbError::NotFound {
                        item: item.to_string(),
                    })
                })?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&explanation).into_diagnostic()?
                );
            } else {
                print!("{explanation}");
            }
        }
    }

    Ok(())
}

/// Parse a command-line item; a bare statement is read as a fact.
fn parse_arg(text: &str) -> Result<Item> {
    let text = text.trim();
    let item = if text.starts_with('(') {
        text.parse::<forward_tms::logic::Statement>().map(Item::from)
    } else {
        text.parse::<Item>()
    };
    Ok(item.map_err(TmsError::from)?)
}
