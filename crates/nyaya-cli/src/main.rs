//! Command-line front end: analyze a charge from extracted JSON, inspect
//! the rule corpus, validate rule files before loading them.

mod display;

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nyaya_ai::{LanguageCapability, LexicalCapability, RemoteCapability};
use nyaya_core::{ChargeCategory, Language, RuleId, StructuredData};
use nyaya_pipeline::{AnalysisRequest, Pipeline, PipelineConfig};
use nyaya_store::RuleStore;

#[derive(Parser)]
#[command(name = "nyaya")]
#[command(about = "Checks charges against Indian consumer-protection rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Extra rules file loaded over the built-in corpus
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Base URL of a remote embedding/completion service; without it the
    /// built-in lexical embedder is used and narratives stay templated
    #[arg(long, global = true, env = "NYAYA_REMOTE_URL")]
    remote_url: Option<String>,

    /// Model name passed to the remote service
    #[arg(long, global = true, env = "NYAYA_REMOTE_MODEL", default_value = "default")]
    remote_model: String,

    /// Embedding width the remote service produces
    #[arg(long, global = true, default_value_t = 384)]
    remote_dim: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one charge and print the verdict
    Analyze {
        /// Extracted charge data as JSON; stdin when omitted
        file: Option<PathBuf>,

        /// The complainant's own words, added to retrieval
        #[arg(short, long)]
        query: Option<String>,

        /// Verdict language (en, hi)
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Budget in milliseconds for each embedding or completion call
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,

        /// Print the verdict as JSON instead of a card
        #[arg(long)]
        json: bool,
    },

    /// Inspect the rule corpus
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List rules, newest version of each
    List {
        /// Restrict to one category (mrp, service_charge, challan, other)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show one rule as a card
    Show {
        /// Rule id, e.g. LM-18-1
        id: String,

        /// A specific stored version instead of the latest
        #[arg(long)]
        version: Option<u32>,

        /// Every stored version, oldest first
        #[arg(long)]
        history: bool,
    },

    /// Check a rules file without loading it anywhere
    Validate {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("nyaya v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let store = open_store(&cli)?;

    match &cli.command {
        Commands::Analyze { file, query, language, timeout_ms, json } => {
            let language: Language = language.parse()?;
            let data = read_structured_data(file.as_deref())?;
            let capability = build_capability(&cli)?;
            let config = PipelineConfig {
                capability_timeout: Duration::from_millis(*timeout_ms),
                ..PipelineConfig::default()
            };
            let pipeline = Pipeline::new(store, capability, config).await;

            let request = AnalysisRequest {
                data,
                query: query.clone(),
                language,
            };
            let verdict = pipeline.analyze(&request).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                display::print_verdict(&verdict);
            }
        }

        Commands::Rules { command } => run_rules(&store, command)?,
    }
    Ok(())
}

fn run_rules(store: &RuleStore, command: &RulesCommand) -> anyhow::Result<()> {
    match command {
        RulesCommand::List { category } => {
            let rules = match category {
                Some(raw) => store.by_category(parse_category(raw)?)?,
                None => store.all()?,
            };
            display::print_rule_table(&rules);
        }

        RulesCommand::Show { id, version, history } => {
            let id = RuleId::new(id);
            if *history {
                for rule in store.history(&id)? {
                    display::print_rule(&rule);
                }
            } else if let Some(version) = version {
                display::print_rule(&store.get_version(&id, *version)?);
            } else {
                let rule = store
                    .get(&id)?
                    .with_context(|| format!("no rule {id}"))?;
                display::print_rule(&rule);
            }
        }

        RulesCommand::Validate { file } => {
            // Throwaway store: validation without touching the live corpus.
            let report = RuleStore::new().load_path(file)?;
            display::print_load_report(&report);
            if !report.is_clean() {
                anyhow::bail!("{} invalid records in {}", report.errors.len(), file.display());
            }
        }
    }
    Ok(())
}

fn open_store(cli: &Cli) -> anyhow::Result<RuleStore> {
    let store = RuleStore::builtin().context("loading built-in rules")?;
    if let Some(path) = &cli.rules {
        let report = store
            .load_path(path)
            .with_context(|| format!("loading {}", path.display()))?;
        if !report.is_clean() {
            display::print_load_report(&report);
            anyhow::bail!("{} invalid records in {}", report.errors.len(), path.display());
        }
        tracing::info!(loaded = report.loaded, path = %path.display(), "extra rules loaded");
    }
    Ok(store)
}

fn build_capability(cli: &Cli) -> anyhow::Result<Arc<dyn LanguageCapability>> {
    match &cli.remote_url {
        Some(url) => {
            let capability =
                RemoteCapability::new(url, &cli.remote_model, cli.remote_dim, Duration::from_secs(10))
                    .context("building remote capability")?;
            Ok(Arc::new(capability))
        }
        None => Ok(Arc::new(LexicalCapability::default())),
    }
}

fn read_structured_data(file: Option<&std::path::Path>) -> anyhow::Result<StructuredData> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parsing charge data")
}

fn parse_category(raw: &str) -> anyhow::Result<ChargeCategory> {
    match raw {
        "mrp" => Ok(ChargeCategory::Mrp),
        "service_charge" => Ok(ChargeCategory::ServiceCharge),
        "challan" => Ok(ChargeCategory::Challan),
        "other" => Ok(ChargeCategory::Other),
        _ => anyhow::bail!("unknown category {raw:?} (mrp, service_charge, challan, other)"),
    }
}
