use clap::{Parser, Subcommand};
use nomenclature_matcher::{
    classify, tokenize, Algorithm, CandidateSource, CorpusScope, EngineConfig, InMemoryCorpus,
    MatchEngine, Query, SynonymTable,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "matcher-cli")]
#[command(about = "Nomenclature matcher CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config (JSON, camelCase keys)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured algorithm (strict, balanced, fuzzy)
    #[arg(short, long, global = true)]
    algorithm: Option<Algorithm>,

    /// Synonym groups (JSON array of arrays)
    #[arg(short, long, global = true)]
    synonyms: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest matches for a query
    Predict {
        /// Material name as typed
        query: String,

        /// Corpus file (JSON)
        #[arg(long)]
        corpus: PathBuf,

        /// Match supplier names of this nomenclature id instead of nomenclature
        #[arg(long)]
        suppliers_of: Option<String>,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show tokens and query kind
    Tokenize {
        /// Material name as typed
        query: String,
    },

    /// Show each strategy's own ranking
    Compare {
        /// Material name as typed
        query: String,

        /// Corpus file (JSON)
        #[arg(long)]
        corpus: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    Ok(config)
}

fn load_engine(cli: &Cli) -> anyhow::Result<MatchEngine> {
    Ok(match &cli.synonyms {
        Some(path) => {
            let table = SynonymTable::from_json(&std::fs::read_to_string(path)?)?;
            tracing::info!("Loaded {} synonym entries", table.len());
            MatchEngine::with_synonyms(Arc::new(table))
        }
        None => MatchEngine::new(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Predict {
            query,
            corpus,
            suppliers_of,
            json,
        } => {
            let engine = load_engine(&cli)?;
            let source = InMemoryCorpus::from_path(corpus)?;
            let scope = match suppliers_of {
                Some(id) => CorpusScope::SuppliersOf(id.clone()),
                None => CorpusScope::AllNomenclature,
            };
            let candidates = source.candidates(&scope).await?;

            let prediction = engine.predict(
                &Query::new(query.as_str()),
                &candidates,
                &config,
                &CancellationToken::new(),
            )?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
                return Ok(());
            }

            println!("🔍 {} ({} candidates, {})", query, candidates.len(), config.algorithm.as_str());
            if let Some(reason) = &prediction.fallback_reason {
                println!("   Fallback: {}", reason);
            }
            for (i, suggestion) in prediction.suggestions.iter().enumerate() {
                println!("   {}. {}", i + 1, suggestion.display());
                if let Some(reasoning) = &suggestion.reasoning {
                    println!("      {}", reasoning);
                }
            }
            println!("   Latency: {:.2}ms", prediction.processing_time_ms);
        }

        Commands::Tokenize { query } => {
            let tokens = tokenize(query, &config.resolve());
            println!("Kind:     {} ({} tokens)", classify(&tokens), tokens.len());
            println!("Material: {:?}", tokens.material);
            println!("Size:     {:?}", tokens.size);
            println!("Brand:    {:?}", tokens.brand);
            println!("Article:  {:?}", tokens.article);
        }

        Commands::Compare { query, corpus } => {
            let engine = load_engine(&cli)?;
            let source = InMemoryCorpus::from_path(corpus)?;
            let outputs = engine.compare_strategies(
                &Query::new(query.as_str()),
                source.nomenclature(),
                &config,
                &CancellationToken::new(),
            )?;

            for output in outputs {
                println!("\n📋 {} ({} results)", output.strategy, output.results.len());
                for (i, result) in output.results.iter().enumerate() {
                    println!("   {}. {}", i + 1, result.display());
                }
            }
        }
    }

    Ok(())
}
