
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{ChatConfig, Config, EmbeddingsConfig, VectorStoreConfig};

#[inline]
pub async fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Contextly Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Embedding Service").bold().yellow());
    eprintln!("Configure the OpenAI-compatible endpoint used to embed documents and questions.");
    eprintln!();
    configure_embeddings(&mut config.embeddings)?;

    eprintln!();
    eprintln!("{}", style("Chat Service").bold().yellow());
    configure_chat(&mut config.chat)?;

    eprintln!();
    eprintln!("{}", style("Vector Store").bold().yellow());
    eprintln!("Vectors are upserted into one namespace per chatbot inside this index.");
    eprintln!();
    configure_vector_store(&mut config.vector_store)?;

    eprintln!();
    if config.chat.api_key.trim().is_empty() {
        eprintln!(
            "{}",
            style("⚠ No OpenAI API key detected (OPENAI_API_KEY).").yellow()
        );
    }
    if config.vector_store.api_key.trim().is_empty() {
        eprintln!(
            "{}",
            style("⚠ No vector store API key detected (PINECONE_API_KEY).").yellow()
        );
    }

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_chat_connection(&config.chat).await? {
        eprintln!("{}", style("✓ Chat endpoint reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the chat endpoint").yellow()
        );
        eprintln!("You can continue, but answer requests will fail until it is reachable.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.embeddings.endpoint).cyan());
    eprintln!("  Model: {}", style(&config.embeddings.model).cyan());
    eprintln!("  Dimension: {}", style(config.embeddings.dimension).cyan());

    eprintln!();
    eprintln!("{}", style("Chat Settings:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.chat.endpoint).cyan());
    eprintln!("  Model: {}", style(&config.chat.model).cyan());
    eprintln!("  Temperature: {}", style(config.chat.temperature).cyan());

    eprintln!();
    eprintln!("{}", style("Vector Store Settings:").bold().yellow());
    eprintln!("  Index: {}", style(&config.vector_store.index_name).cyan());
    eprintln!(
        "  Environment: {}",
        style(&config.vector_store.environment).cyan()
    );
    match config.vector_store.index_url() {
        Ok(url) => eprintln!("  Index URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Index URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Ingestion Settings:").bold().yellow());
    eprintln!(
        "  Chunk size / overlap: {} / {} tokens",
        style(config.chunking.target_chunk_size).cyan(),
        style(config.chunking.overlap_size).cyan()
    );
    eprintln!(
        "  Upsert batch size: {}",
        style(config.ingest.upsert_batch_size).cyan()
    );
    eprintln!(
        "  Metadata byte limit: {}",
        style(config.ingest.metadata_byte_limit).cyan()
    );
    eprintln!("  Retrieval top-k: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let mut config = Config::default();
            config.base_dir = config_dir.to_path_buf();
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_embeddings(embeddings: &mut EmbeddingsConfig) -> Result<()> {
    let endpoint: String = Input::new()
        .with_prompt("Embedding endpoint")
        .default(embeddings.endpoint.clone())
        .validate_with(|input: &String| -> Result<(), String> {
            let temp_config = EmbeddingsConfig {
                endpoint: input.clone(),
                ..EmbeddingsConfig::default()
            };
            temp_config.validate().map_err(|e| e.to_string())
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(embeddings.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(embeddings.dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;

    embeddings.set_endpoint(endpoint)?;
    embeddings.set_model(model)?;
    embeddings.set_dimension(dimension)?;

    Ok(())
}

fn configure_chat(chat: &mut ChatConfig) -> Result<()> {
    let model: String = Input::new()
        .with_prompt("Chat model")
        .default(chat.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(chat.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    chat.set_model(model)?;
    chat.set_temperature(temperature)?;

    Ok(())
}

fn configure_vector_store(vector_store: &mut VectorStoreConfig) -> Result<()> {
    let index_name: String = Input::new()
        .with_prompt("Index name")
        .default(vector_store.index_name.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Index name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let environment: String = Input::new()
        .with_prompt("Index environment/region")
        .default(vector_store.environment.clone())
        .interact_text()?;

    let endpoint: String = Input::new()
        .with_prompt("Index host URL (leave empty to derive from name and environment)")
        .default(vector_store.endpoint.clone())
        .allow_empty(true)
        .interact_text()?;

    vector_store.set_index_name(index_name)?;
    vector_store.set_environment(environment)?;
    vector_store.set_endpoint(endpoint)?;

    Ok(())
}

async fn test_chat_connection(chat: &ChatConfig) -> Result<bool> {
    let url = chat.endpoint_url()?.join("/v1/models")?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;

    let mut request = client.get(url);
    if !chat.api_key.trim().is_empty() {
        request = request.bearer_auth(&chat.api_key);
    }

    // Any HTTP response means the endpoint is reachable; auth failures are
    // reported separately at request time.
    match request.send().await {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}
