use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use synapse_core::{EnneagramType, SynapseConfig};
use synapse_memory::{GraphStore, MemoryGraph};
use synapse_reasoning::Cortex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "synapse.toml")]
    config: PathBuf,

    /// JSON knowledge-graph snapshot to prime against
    #[arg(short, long, env = "SYNAPSE_GRAPH")]
    graph: Option<PathBuf>,

    /// User id the transcript belongs to
    #[arg(short, long, env = "SYNAPSE_USER", default_value = "local")]
    user: String,

    /// Base personality type (name or number), overrides the config
    #[arg(short, long)]
    base_type: Option<EnneagramType>,

    /// Priming budget per line in milliseconds
    #[arg(long, default_value_t = 200)]
    deadline_ms: u64,

    /// Print each inference as a JSON line instead of the guidance block
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Neo4j bolt URI; takes precedence over --graph
    #[cfg(feature = "neo4j")]
    #[arg(long, env = "NEO4J_URI")]
    neo4j_uri: Option<String>,

    #[cfg(feature = "neo4j")]
    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    neo4j_user: String,

    #[cfg(feature = "neo4j")]
    #[arg(long, env = "NEO4J_PASSWORD", default_value = "")]
    neo4j_password: String,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_graph(args: &Args) -> anyhow::Result<Arc<dyn GraphStore>> {
    #[cfg(feature = "neo4j")]
    if let Some(uri) = &args.neo4j_uri {
        info!("Connecting to Neo4j at {}...", uri);
        let graph =
            synapse_memory::Neo4jGraph::connect(uri, &args.neo4j_user, &args.neo4j_password).await?;
        return Ok(Arc::new(graph));
    }

    match &args.graph {
        Some(path) => {
            info!("Loading knowledge graph from {}...", path.display());
            let graph = MemoryGraph::load(path)?;
            info!("Graph ready: {} nodes, {} edges", graph.node_count(), graph.edge_count());
            Ok(Arc::new(graph))
        }
        None => {
            warn!("No knowledge graph given, priming will produce no context");
            Ok(Arc::new(MemoryGraph::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = SynapseConfig::load_or_default(&args.config);
    if let Some(base_type) = args.base_type {
        config.persona.base_type = base_type;
    }

    info!("Initializing Synapse...");
    let graph = open_graph(&args).await?;
    let cortex = Cortex::from_config(&config, graph)
        .await
        .context("Failed to initialize cortex")?;
    info!(
        "Base personality: {}, store: {}",
        cortex.base_type(),
        config.storage.db_path
    );

    let deadline = Duration::from_millis(args.deadline_ms);
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        if !args.json {
            print!("> ");
            io::stdout().flush()?;
        }

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let trimmed = input.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        let until = tokio::time::Instant::now() + deadline;
        match cortex.engine().prime_until(&args.user, trimmed, until).await {
            Ok(report) => info!(
                "Primed {} keywords ({} cached, {} activated) in {:?}",
                report.requested, report.already_cached, report.activated, report.elapsed
            ),
            Err(e) => warn!("Priming cut short: {}", e),
        }

        let outcome = match cortex.infer(&args.user, trimmed).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Inference failed: {}", e);
                continue;
            }
        };

        if args.json {
            println!("{}", serde_json::to_string(&outcome.inference)?);
            continue;
        }

        match cortex.compose_guidance(&args.user, trimmed, &outcome).await {
            Ok(guidance) => {
                println!(
                    "\n[{} | {} mode | desire: {} {:.0}%]\n\n{}\n",
                    outcome.router.active_type,
                    outcome.router.mode.as_str(),
                    outcome.inference.desire,
                    outcome.inference.confidence * 100.0,
                    guidance
                );
            }
            Err(e) => error!("Failed to compose guidance: {}", e),
        }
    }

    Ok(())
}
