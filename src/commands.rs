use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::answer::{AnswerOutcome, AnswerRequest, Responder};
use crate::config::{Config, get_config_dir};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::NewCustomization;
use crate::ingest::{Ingestor, SourceIngestOutcome};
use crate::sources::SourceInput;

/// Ingest URLs, files, and raw text into a chatbot's namespace
#[inline]
pub async fn run_ingest(
    tenant: &str,
    chatbot_id: &str,
    urls: Vec<String>,
    files: Vec<PathBuf>,
    text: Option<String>,
) -> Result<()> {
    let input = SourceInput {
        urls,
        files,
        raw_text: text,
    };
    if input.is_empty() {
        bail!("Nothing to ingest: provide at least one --url, --file, or --text");
    }

    let config = load_config()?;
    let ingestor = Ingestor::new(&config).context("Failed to initialize ingestion pipeline")?;

    info!(
        "Starting ingestion of {} sources for tenant '{}'",
        input.source_count(),
        tenant
    );

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner} {msg}").context("Invalid progress template")?,
    );
    progress.set_message(format!("Ingesting {} sources...", input.source_count()));
    progress.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = ingestor.ingest(tenant, chatbot_id, &input).await;
    progress.finish_and_clear();

    let report = result?;

    for source in &report.sources {
        match source.outcome {
            SourceIngestOutcome::Indexed {
                chunks,
                vectors_upserted,
            } => {
                println!(
                    "{} {} ({} chunks, {} vectors)",
                    style("✓").green(),
                    source.identifier,
                    chunks,
                    vectors_upserted
                );
            }
            SourceIngestOutcome::Failed { ref reason } => {
                println!(
                    "{} {}: {}",
                    style("✗").red(),
                    source.identifier,
                    reason
                );
            }
        }
    }

    println!();
    println!(
        "Ingested {}/{} sources into namespace '{}'",
        report.indexed_count(),
        report.sources.len(),
        chatbot_id
    );

    Ok(())
}

/// Answer a visitor's question from a chatbot's ingested content
#[inline]
pub async fn run_ask(
    tenant: &str,
    chatbot_id: &str,
    visitor_id: &str,
    question: &str,
) -> Result<()> {
    let config = load_config()?;
    let database = open_history_database(&config).await?;
    let responder =
        Responder::new(&config, database).context("Failed to initialize answer pipeline")?;

    let request = AnswerRequest {
        tenant: tenant.to_string(),
        chatbot_id: chatbot_id.to_string(),
        visitor_id: visitor_id.to_string(),
        question: question.to_string(),
    };

    match responder.answer(&request).await? {
        AnswerOutcome::Answered { reply, message_id } => {
            println!("{reply}");
            println!();
            println!("{}", style(format!("message id: {message_id}")).dim());
        }
        AnswerOutcome::NoContext => {
            println!(
                "{}",
                style("No relevant content found for this question.").yellow()
            );
        }
    }

    Ok(())
}

/// Store or replace the system prompt for a (tenant, chatbot) pair
#[inline]
pub async fn run_customize(tenant: &str, chatbot_id: &str, system_prompt: &str) -> Result<()> {
    if system_prompt.trim().is_empty() {
        bail!("The system prompt cannot be empty");
    }

    let config = load_config()?;
    let database = open_history_database(&config).await?;

    let customization = database
        .upsert_customization(NewCustomization {
            tenant: tenant.to_string(),
            chatbot_id: chatbot_id.to_string(),
            system_prompt: system_prompt.to_string(),
        })
        .await?;

    println!(
        "{} Stored system prompt for tenant '{}', chatbot '{}'",
        style("✓").green(),
        customization.tenant,
        customization.chatbot_id
    );

    Ok(())
}

/// Print the stored conversation for a (tenant, visitor, chatbot) triple
#[inline]
pub async fn run_history(tenant: &str, chatbot_id: &str, visitor_id: &str) -> Result<()> {
    let config = load_config()?;
    let database = open_history_database(&config).await?;

    let turns = database
        .conversation_messages(tenant, visitor_id, chatbot_id)
        .await?;

    if turns.is_empty() {
        println!(
            "No conversation recorded for visitor '{}' on chatbot '{}'",
            visitor_id, chatbot_id
        );
        return Ok(());
    }

    for turn in &turns {
        println!(
            "[{}] {}: {}",
            turn.created_date.format("%Y-%m-%d %H:%M:%S"),
            turn.sender,
            turn.text
        );
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    Config::load(config_dir)
}

async fn open_history_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config_dir(config.get_base_dir())
        .await
        .context("Failed to open conversation history database")
}
