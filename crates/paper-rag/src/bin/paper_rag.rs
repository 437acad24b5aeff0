//! paper-rag command line
//!
//! Run with: cargo run -p paper-rag -- ask "graph neural networks" "How are GNNs evaluated?"

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paper_rag::config::EmbedderKind;
use paper_rag::export::{export_markdown, format_key_paper, render_answer};
use paper_rag::generation::Summarizer;
use paper_rag::sources::{abstracts, ArxivSource, DocumentSource};
use paper_rag::{BackendRegistry, GenerationConfig, Paper, RagConfig, RagPipeline};

/// Ask research questions over arXiv abstracts
#[derive(Parser)]
#[command(name = "paper-rag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search arXiv and list matching papers
    Fetch {
        /// arXiv search query
        query: String,

        /// Maximum number of papers
        #[arg(long)]
        max: Option<usize>,

        /// Summarize each abstract with the generation backend
        #[arg(long)]
        summarize: bool,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Fetch papers, index their abstracts and answer a question
    Ask {
        /// arXiv search query used to build the collection
        query: String,

        /// Question to answer
        question: String,

        /// Maximum number of papers
        #[arg(long)]
        max: Option<usize>,

        /// Number of abstracts retrieved for the answer
        #[arg(short)]
        k: Option<usize>,

        /// Embedding backend
        #[arg(long, value_enum)]
        embedder: Option<EmbedderArg>,

        /// Write the answer and its sources to a markdown file
        #[arg(long)]
        export: Option<PathBuf>,

        #[command(flatten)]
        generation: GenerationArgs,
    },
}

#[derive(Args)]
struct GenerationArgs {
    /// Generation provider (Ollama or Gemini)
    #[arg(long, default_value = "Ollama")]
    provider: String,

    /// Model name; the provider default is used when omitted
    #[arg(long)]
    model: Option<String>,

    /// API key for cloud providers
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl GenerationArgs {
    fn to_config(&self) -> GenerationConfig {
        let mut config = GenerationConfig::new(self.provider.clone());
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderArg {
    Ollama,
    Hashing,
}

impl From<EmbedderArg> for EmbedderKind {
    fn from(arg: EmbedderArg) -> Self {
        match arg {
            EmbedderArg::Ollama => EmbedderKind::Ollama,
            EmbedderArg::Hashing => EmbedderKind::Hashing,
        }
    }
}

fn spinner(message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.into());
    Ok(pb)
}

async fn fetch_papers(config: &RagConfig, query: &str, max: Option<usize>) -> anyhow::Result<Vec<Paper>> {
    let source = ArxivSource::new(&config.source)?;
    let pb = spinner(format!("Searching {} for \"{}\"", source.name(), query))?;
    let papers = source.fetch(query, max.unwrap_or(config.source.max_results)).await;
    pb.finish_and_clear();
    Ok(papers?)
}

async fn run_fetch(
    config: RagConfig,
    query: &str,
    max: Option<usize>,
    summarize: bool,
    generation: &GenerationArgs,
) -> anyhow::Result<()> {
    let papers = fetch_papers(&config, query, max).await?;
    if papers.is_empty() {
        println!("No papers found for \"{}\"", query);
        return Ok(());
    }

    let summaries = if summarize {
        let summarizer = Summarizer::new(Arc::new(BackendRegistry::from_config(&config.llm)?));
        let pb = spinner(format!("Summarizing {} abstracts", papers.len()))?;
        let summaries = summarizer
            .batch_summarize(&abstracts(&papers), &generation.to_config())
            .await;
        pb.finish_and_clear();
        Some(summaries?)
    } else {
        None
    };

    for (i, paper) in papers.iter().enumerate() {
        println!("{}. {}", i + 1, format_key_paper(paper).trim_start_matches("- "));
        println!("   {}", paper.source_url);
        if let Some(summary) = summaries.as_ref().and_then(|s| s.get(i)) {
            for line in summary.lines() {
                println!("   {}", line);
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_ask(
    mut config: RagConfig,
    query: &str,
    question: &str,
    max: Option<usize>,
    k: Option<usize>,
    embedder: Option<EmbedderArg>,
    export: Option<PathBuf>,
    generation: &GenerationArgs,
) -> anyhow::Result<()> {
    if let Some(kind) = embedder {
        config.embeddings.provider = kind.into();
    }

    let papers = fetch_papers(&config, query, max).await?;
    if papers.is_empty() {
        anyhow::bail!("No papers found for \"{}\"", query);
    }

    let mut rag = RagPipeline::from_config(&config)?;

    let pb = spinner(format!("Embedding {} abstracts", papers.len()))?;
    let built = rag.build_index(abstracts(&papers)).await;
    pb.finish_and_clear();
    built?;

    let pb = spinner(format!("Answering with {}", generation.provider))?;
    let answer = rag
        .answer(question, generation.to_config(), k.unwrap_or(config.retrieval.default_k))
        .await;
    pb.finish_and_clear();
    let answer = answer?;

    println!("\n{}\n", answer.text.trim());
    println!("Sources:");
    for (i, hit) in answer.hits.iter().enumerate() {
        let title = papers.get(hit.doc_id).map_or("", |p| p.title.as_str());
        let marker = if answer.citations.contains(&(i + 1)) { "*" } else { " " };
        println!("{} Doc {} [{:.4}] {}", marker, i + 1, hit.distance, title);
    }

    if let Some(path) = export {
        export_markdown(&render_answer(question, &answer), &path)?;
        println!("\nSaved to {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch {
            query,
            max,
            summarize,
            generation,
        } => run_fetch(config, &query, max, summarize, &generation).await,
        Commands::Ask {
            query,
            question,
            max,
            k,
            embedder,
            export,
            generation,
        } => run_ask(config, &query, &question, max, k, embedder, export, &generation).await,
    }
}
