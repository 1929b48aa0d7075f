//! Aerograph CLI: retrieval, question answering and model comparison
//!
//! Runs the engine in-process against the configured store. With the memory
//! backend the graph comes from `--data` (a JSON array of journey records)
//! or the built-in sample.

mod sample;

use aerograph::config::{AppConfig, StoreBackend};
use aerograph::embed::{Embedders, JourneyIndexer};
use aerograph::eval::{default_cases, run_cases, ModelSummary};
use aerograph::evidence::Evidence;
use aerograph::graph::{GraphStore, JourneyRecord};
use aerograph::http::{AppState, HttpServer};
use aerograph::intent::{Entities, Intent};
use aerograph::pipeline::Assistant;
use aerograph::retrieve::Retriever;
use aerograph::store::{GraphAccessor, HttpAccessor, MemoryAccessor};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Parser)]
#[command(name = "aerograph", version, about = "Airline Graph-RAG retrieval engine")]
struct Cli {
    /// Configuration file (YAML, or KEY=value lines)
    #[arg(long, global = true, env = "AEROGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// JSON array of journey records for the in-process store
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported intents and their templates
    Intents,
    /// Retrieve evidence for an intent and parameters
    Retrieve {
        intent: String,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        destination: Option<String>,
        #[arg(long)]
        flight_number: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        /// Question text for the embedding channel
        #[arg(long, default_value = "")]
        query: String,
        /// Embedding model (minilm, mpnet)
        #[arg(long)]
        embedder: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a natural-language question
    Ask {
        question: String,
        #[arg(long)]
        embedder: Option<String>,
    },
    /// Compare chat models on the reference questions
    Compare {
        /// Model names or aliases
        #[arg(long, value_delimiter = ',', default_value = "qwen,openai,meta")]
        models: Vec<String>,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Intents => run_intents(&cli.format),
        Commands::Retrieve {
            intent,
            origin,
            destination,
            flight_number,
            code,
            limit,
            query,
            embedder,
            top_k,
        } => {
            let retriever = build_retriever(&config, cli.data.as_deref()).await?;
            let entities = Entities {
                origin: origin.map(Into::into),
                destination: destination.map(Into::into),
                flight_number: flight_number.map(Into::into),
                code: code.map(Into::into),
                limit: limit.map(Into::into),
            };
            let bundle = retriever
                .retrieve(&intent, &entities, &query, embedder.as_deref(), top_k)
                .await;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bundle)?),
                OutputFormat::Table => {
                    println!("Baseline");
                    print_evidence(&bundle.baseline);
                    println!("\nEmbedding");
                    print_evidence(&bundle.embedding);
                }
            }
            Ok(())
        }
        Commands::Ask { question, embedder } => {
            let retriever = build_retriever(&config, cli.data.as_deref()).await?;
            let assistant = build_assistant(&config, retriever)?;
            let interaction = assistant.ask(&question, embedder.as_deref()).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&interaction)?),
                OutputFormat::Table => {
                    println!("Intent:   {}", interaction.intent);
                    println!("Entities: {}", serde_json::to_string(&interaction.entities)?);
                    println!("Baseline");
                    print_evidence(&interaction.evidence.baseline);
                    println!("\n{}", interaction.answer);
                    println!("({:.2}s)", interaction.timings.total);
                }
            }
            Ok(())
        }
        Commands::Compare { models } => {
            let retriever = build_retriever(&config, cli.data.as_deref()).await?;
            run_compare(&config, retriever, &models, &cli.format).await
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let retriever = build_retriever(&config, cli.data.as_deref()).await?;
            let assistant = if config.nlq.enabled {
                Some(Arc::new(build_assistant(&config, retriever.clone())?))
            } else {
                info!("No language model configured; /api/ask is disabled");
                None
            };
            let state = AppState { retriever, assistant };
            HttpServer::new(state, &config.server).start().await?;
            Ok(())
        }
    }
}

async fn build_retriever(config: &AppConfig, data: Option<&Path>) -> anyhow::Result<Arc<Retriever>> {
    let embedders = Embedders::for_backend(&config.embed, config.store.backend)?;

    let accessor: Arc<dyn GraphAccessor> = match config.store.backend {
        StoreBackend::Neo4j => Arc::new(HttpAccessor::new(&config.store)?),
        StoreBackend::Memory => {
            let store = Arc::new(RwLock::new(load_graph(data)?));
            let indexer = JourneyIndexer::default();
            for name in embedders.available() {
                if let Some(embedder) = embedders.get(&name) {
                    let count = indexer.index(&store, embedder.as_ref()).await?;
                    info!("Embedded {} journeys with {}", count, name);
                }
            }
            Arc::new(MemoryAccessor::from_shared(store))
        }
    };

    Ok(Arc::new(Retriever::new(accessor, embedders, config.retrieval.clone())))
}

fn load_graph(data: Option<&Path>) -> anyhow::Result<GraphStore> {
    let Some(path) = data else {
        info!("Using the built-in sample graph");
        return Ok(sample::graph()?);
    };
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<JourneyRecord> =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    let mut store = GraphStore::new();
    let count = sample::load(&mut store, &records)?;
    info!("Loaded {} journeys from {}", count, path.display());
    Ok(store)
}

fn build_assistant(config: &AppConfig, retriever: Arc<Retriever>) -> anyhow::Result<Assistant> {
    if !config.nlq.enabled {
        bail!("no language model configured (set HUGGINGFACE_TOKEN or nlq.enabled)");
    }
    Ok(Assistant::from_config(&config.nlq, retriever)?)
}

fn run_intents(format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let intents: Vec<_> = Intent::ALL
                .iter()
                .map(|intent| {
                    let template = intent.template();
                    serde_json::json!({
                        "name": intent.as_str(),
                        "params": template.params.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                        "columns": template.columns,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&intents)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Intent", "Parameters", "Columns"]);
            for intent in Intent::ALL {
                let template = intent.template();
                let params: Vec<&str> = template.params.iter().map(|p| p.as_str()).collect();
                table.add_row(vec![
                    intent.as_str().to_string(),
                    params.join(", "),
                    template.columns.join(", "),
                ]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

async fn run_compare(
    config: &AppConfig,
    retriever: Arc<Retriever>,
    models: &[String],
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let cases = default_cases();
    let mut summaries = Vec::new();
    let mut all_outcomes = Vec::new();

    for model in models {
        let mut nlq = config.nlq.clone();
        nlq.model = model.clone();
        let scoped = AppConfig {
            nlq,
            ..config.clone()
        };
        let assistant = build_assistant(&scoped, retriever.clone())?;
        info!("Running {} cases with {}", cases.len(), assistant.model_name());

        let outcomes = run_cases(&assistant, &cases).await;
        summaries.push(ModelSummary::from_outcomes(model, &outcomes));
        all_outcomes.extend(outcomes);
    }

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({ "summary": summaries, "cases": all_outcomes });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                "Model", "Success", "Intent Acc", "Entity Acc", "Intent", "Entities", "Retrieval", "Answer",
                "Total", "Avg Tokens",
            ]);
            for s in &summaries {
                let ok = s.successes > 0;
                let ratio = |n: usize| if ok { format!("{}/{}", n, s.cases) } else { "N/A".to_string() };
                let secs = |t: f64| if ok { format!("{:.2}s", t) } else { "N/A".to_string() };
                table.add_row(vec![
                    s.model.clone(),
                    format!("{}/{}", s.successes, s.cases),
                    ratio(s.intent_correct),
                    ratio(s.entities_correct),
                    secs(s.mean_timings.intent),
                    secs(s.mean_timings.entities),
                    secs(s.mean_timings.retrieval),
                    secs(s.mean_timings.answer),
                    secs(s.mean_timings.total),
                    if ok { s.mean_tokens.to_string() } else { "N/A".to_string() },
                ]);
            }
            println!("{}", table);

            for case in &cases {
                println!("\n[{}] {}", case.id, case.question);
                for outcome in all_outcomes.iter().filter(|o| o.case_id == case.id) {
                    match (&outcome.answer, &outcome.error) {
                        (Some(answer), _) => println!("  {}: {}", outcome.model, answer),
                        (None, Some(error)) => println!("  {}: ERROR {}", outcome.model, error),
                        (None, None) => {}
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_evidence(evidence: &Evidence) {
    let records = evidence.records();
    let Some(first) = records.first() else {
        println!("(no results)");
        return;
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(first.keys().cloned().collect::<Vec<_>>());
    for record in &records {
        table.add_row(record.values().map(format_table_value).collect::<Vec<_>>());
    }
    println!("{}", table);
    if evidence.is_data() {
        println!("{} row(s)", records.len());
    }
}

fn format_table_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
