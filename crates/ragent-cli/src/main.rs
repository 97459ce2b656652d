//! `ragent` command-line front end: ask, chat, and search over local text sources.

mod config;
mod ingest;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use ragent_agent::{AgentOutcome, AgentRunner, ConversationWindow, LlmClient, LlmRole};
use ragent_core::Message;
use ragent_memory::{create_provider, EmbeddingProvider, KbId, KnowledgeBaseStore};
use ragent_tools::retrieval::format_hits;
use ragent_tools::{DuckDuckGoSearch, RetrievalTool, Toolbox, WebSearchProvider, WebSearchTool};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, RagentConfig};
use crate::ingest::{describe_sources, read_sources};

#[derive(Parser)]
#[command(name = "ragent", about = "Agentic RAG over local documents with web fallback")]
struct Cli {
    /// Path to config file (default: ./ragent.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question from the given sources
    Ask {
        /// Plain-text source file; repeatable
        #[arg(short, long = "source", required = true)]
        sources: Vec<PathBuf>,
        /// Description of the sources for the system prompt
        #[arg(short, long)]
        description: Option<String>,
        /// Print the full outcome, tool trace included, as JSON
        #[arg(long)]
        json: bool,
        question: String,
    },
    /// Interactive conversation over stdin
    Chat {
        /// Plain-text source file; repeatable
        #[arg(short, long = "source")]
        sources: Vec<PathBuf>,
    },
    /// Print hybrid retrieval hits for a query
    Search {
        /// Plain-text source file; repeatable
        #[arg(short, long = "source", required = true)]
        sources: Vec<PathBuf>,
        /// Number of hits
        #[arg(short, default_value_t = 5)]
        k: usize,
        query: String,
    },
}

/// Long-lived pieces shared by every knowledge base and run.
struct App {
    config: RagentConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<KnowledgeBaseStore>,
    web: Arc<dyn WebSearchProvider>,
}

impl App {
    fn new(config: RagentConfig) -> anyhow::Result<Self> {
        let embedder = create_provider(&config.embedding)?;
        let web: Arc<dyn WebSearchProvider> =
            Arc::new(DuckDuckGoSearch::new(&config.web_search)?);
        Ok(Self {
            config,
            embedder,
            store: Arc::new(KnowledgeBaseStore::new()),
            web,
        })
    }

    async fn ingest(
        &self,
        sources: &[PathBuf],
        description: Option<String>,
    ) -> anyhow::Result<(KbId, String)> {
        let blocks = read_sources(sources).await?;
        let description = description.unwrap_or_else(|| describe_sources(sources));
        let id = self
            .store
            .build(
                &blocks,
                description.clone(),
                &self.config.chunking,
                self.embedder.clone(),
            )
            .await
            .context("Failed to build knowledge base")?;
        Ok((id, description))
    }

    fn runner(&self, kb: KbId, description: &str) -> anyhow::Result<AgentRunner> {
        let max_chars = self.config.agent.max_tool_output_chars;
        let retrieval = RetrievalTool::new(self.store.clone(), kb, self.config.retrieval.top_k)
            .with_max_chars(max_chars);
        let web_search = WebSearchTool::new(self.web.clone(), self.config.web_search.max_results)
            .with_max_chars(max_chars);

        let reasoner = LlmClient::new(self.config.model.clone(), LlmRole::Reasoning)?;
        let evaluator = LlmClient::new(self.config.evaluator(), LlmRole::Evaluation)?;

        Ok(AgentRunner::new(
            reasoner,
            evaluator,
            Toolbox::new(retrieval, web_search),
            description,
            self.config.agent.policy.clone(),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config.as_deref()).await?;
    let app = App::new(config)?;

    match cli.command {
        Commands::Ask {
            sources,
            description,
            json,
            question,
        } => {
            let (kb, description) = app.ingest(&sources, description).await?;
            let runner = app.runner(kb, &description)?;
            let outcome = runner.run(&question, &[]).await?;
            report_dangling(&outcome);
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.answer);
            }
        }
        Commands::Search { sources, k, query } => {
            let (kb, _) = app.ingest(&sources, None).await?;
            let hits = app.store.retrieve(kb, &query, k).await?;
            if hits.is_empty() {
                println!("No hits.");
            } else {
                println!("{}", format_hits(&hits));
            }
        }
        Commands::Chat { sources } => chat(&app, &sources).await?,
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn report_dangling(outcome: &AgentOutcome) {
    let dangling = outcome.dangling_citations();
    if !dangling.is_empty() {
        warn!(?dangling, "Answer cites labels no retrieval returned");
    }
}

/// The knowledge base a chat is currently talking to.
struct Session {
    kb: KbId,
    runner: AgentRunner,
}

async fn chat(app: &App, sources: &[PathBuf]) -> anyhow::Result<()> {
    let mut window = ConversationWindow::new(app.config.agent.history_turns);
    let mut session = None;
    if !sources.is_empty() {
        session = Some(open_session(app, sources).await?);
    }

    println!("Commands: /source <file>..., /clean, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "/quit" {
            break;
        }
        if line == "/clean" {
            let removed = app
                .store
                .sweep_idle(app.config.knowledge.max_idle(), Utc::now());
            if matches!(&session, Some(s) if removed.contains(&s.kb)) {
                session = None;
                window.clear();
            }
            println!("Removed {} idle knowledge base(s).", removed.len());
            continue;
        }
        if let Some(rest) = line.strip_prefix("/source") {
            let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
            if paths.is_empty() {
                println!("Usage: /source <file>...");
                continue;
            }
            match open_session(app, &paths).await {
                Ok(next) => {
                    session = Some(next);
                    window.clear();
                }
                Err(e) => error!("{e:#}"),
            }
            continue;
        }

        let Some(active) = &session else {
            println!("Add a source with /source <file> to begin.");
            continue;
        };

        window.push(Message::user(line));
        match active.runner.run(line, window.recent()).await {
            Ok(outcome) => {
                report_dangling(&outcome);
                println!("{}", outcome.answer);
                window.push(Message::assistant(outcome.answer));
            }
            Err(e) => {
                window.pop_user();
                error!("{e}");
            }
        }
    }

    Ok(())
}

async fn open_session(app: &App, sources: &[PathBuf]) -> anyhow::Result<Session> {
    let (kb, description) = app.ingest(sources, None).await?;
    let runner = app.runner(kb, &description)?;
    info!(kb = %kb, chunks = app.store.chunk_count(kb)?, "Switched knowledge base");
    Ok(Session { kb, runner })
}
