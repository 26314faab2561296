use std::path::PathBuf;

use clap::{Parser, Subcommand};
use contextly::Result;
use contextly::commands::{run_ask, run_customize, run_history, run_ingest};
use contextly::config::{get_config_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "contextly")]
#[command(about = "Retrieval-augmented chatbot backend: ingest documents, answer questions with retrieved context")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure service endpoints and credentials
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ingest documents into a chatbot's namespace
    Ingest {
        /// Tenant (client) that owns the chatbot
        #[arg(long)]
        tenant: String,
        /// Chatbot whose namespace receives the vectors
        #[arg(long)]
        chatbot: String,
        /// Web page to fetch and ingest (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,
        /// Local file to extract and ingest (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Raw text to ingest as a single source
        #[arg(long)]
        text: Option<String>,
    },
    /// Ask a question against a chatbot's ingested content
    Ask {
        /// Tenant (client) that owns the chatbot
        #[arg(long)]
        tenant: String,
        /// Chatbot to query
        #[arg(long)]
        chatbot: String,
        /// Visitor the conversation belongs to
        #[arg(long)]
        visitor: String,
        /// The question to answer
        question: String,
    },
    /// Set the system prompt for a (tenant, chatbot) pair
    Customize {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        chatbot: String,
        /// The system prompt the chatbot answers with
        prompt: String,
    },
    /// Show the stored conversation for a visitor
    History {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        chatbot: String,
        #[arg(long)]
        visitor: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            let config_dir = get_config_dir()?;
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir).await?;
            }
        }
        Commands::Ingest {
            tenant,
            chatbot,
            urls,
            files,
            text,
        } => {
            run_ingest(&tenant, &chatbot, urls, files, text).await?;
        }
        Commands::Ask {
            tenant,
            chatbot,
            visitor,
            question,
        } => {
            run_ask(&tenant, &chatbot, &visitor, &question).await?;
        }
        Commands::Customize {
            tenant,
            chatbot,
            prompt,
        } => {
            run_customize(&tenant, &chatbot, &prompt).await?;
        }
        Commands::History {
            tenant,
            chatbot,
            visitor,
        } => {
            run_history(&tenant, &chatbot, &visitor).await?;
        }
    }

    Ok(())
}
