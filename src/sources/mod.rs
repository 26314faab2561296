// Document normalization: heterogeneous inputs become a uniform,
// order-preserving sequence of source documents


pub mod extract;
pub mod fetch;

use std::path::PathBuf;

use anyhow::Result;
use futures::StreamExt;
use tracing::{debug, warn};

pub use fetch::{FetchConfig, PageFetcher, validate_url};

/// Synthetic identifier assigned to a raw-text source.
pub const RAW_TEXT_IDENTIFIER: &str = "0";

/// How many page fetches may be in flight at once. Results still come back
/// in input order.
const FETCH_CONCURRENCY: usize = 4;

/// Everything one ingestion call may pull text from. Any combination of the
/// three categories is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInput {
    /// Web pages to fetch and reduce to visible text
    pub urls: Vec<String>,
    /// Uploaded files to extract text from
    pub files: Vec<PathBuf>,
    /// A single raw-text source
    pub raw_text: Option<String>,
}

impl SourceInput {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.files.is_empty() && self.raw_text.is_none()
    }

    /// Total number of sources this input will produce outcomes for.
    #[inline]
    pub fn source_count(&self) -> usize {
        self.urls.len() + self.files.len() + usize::from(self.raw_text.is_some())
    }
}

/// A normalized source ready for chunking. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// URL, file name, or [`RAW_TEXT_IDENTIFIER`] for raw text
    pub identifier: String,
    pub text: String,
}

/// Per-source result of normalization.
///
/// One unreachable URL or unreadable file is reported here instead of
/// aborting the batch, so sibling sources always get their chance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Loaded(SourceDocument),
    Failed { identifier: String, reason: String },
}

impl SourceOutcome {
    #[inline]
    pub fn identifier(&self) -> &str {
        match *self {
            SourceOutcome::Loaded(ref document) => &document.identifier,
            SourceOutcome::Failed { ref identifier, .. } => identifier,
        }
    }
}

/// Turns URLs, uploaded files, and raw text into source documents.
#[derive(Debug, Clone)]
pub struct SourceNormalizer {
    fetcher: PageFetcher,
    fetch_concurrency: usize,
}

impl SourceNormalizer {
    #[inline]
    pub fn new() -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(FetchConfig::default())?,
            fetch_concurrency: FETCH_CONCURRENCY,
        })
    }

    #[inline]
    pub fn with_fetcher(fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            fetch_concurrency: FETCH_CONCURRENCY,
        }
    }

    /// Normalize an input into one outcome per source.
    ///
    /// Outcomes are grouped by category (URLs, then files, then raw text)
    /// and keep the input order within each category. URL fetches run with
    /// bounded parallelism; file extraction is sequential.
    #[inline]
    pub async fn normalize(&self, input: &SourceInput) -> Vec<SourceOutcome> {
        let mut outcomes = Vec::with_capacity(input.source_count());

        let fetched: Vec<SourceOutcome> = futures::stream::iter(&input.urls)
            .map(|url| self.fetch_one(url))
            .buffered(self.fetch_concurrency)
            .collect()
            .await;
        outcomes.extend(fetched);

        for path in &input.files {
            let identifier = path.to_string_lossy().into_owned();
            match extract::extract_text(path).await {
                Ok(text) => {
                    outcomes.push(SourceOutcome::Loaded(SourceDocument { identifier, text }));
                }
                Err(err) => {
                    warn!("Skipping file source '{}': {:#}", identifier, err);
                    outcomes.push(SourceOutcome::Failed {
                        identifier,
                        reason: format!("{err:#}"),
                    });
                }
            }
        }

        if let Some(ref text) = input.raw_text {
            outcomes.push(SourceOutcome::Loaded(SourceDocument {
                identifier: RAW_TEXT_IDENTIFIER.to_string(),
                text: text.clone(),
            }));
        }

        debug!("Normalized {} sources", outcomes.len());
        outcomes
    }

    async fn fetch_one(&self, url: &str) -> SourceOutcome {
        match self.fetcher.fetch_text(url).await {
            Ok(text) => SourceOutcome::Loaded(SourceDocument {
                identifier: url.to_string(),
                text,
            }),
            Err(err) => {
                warn!("Skipping URL source '{}': {:#}", url, err);
                SourceOutcome::Failed {
                    identifier: url.to_string(),
                    reason: format!("{err:#}"),
                }
            }
        }
    }
}
