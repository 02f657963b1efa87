//! Strategy fallback chain for document extraction.
//!
//! Strategies are tried in registration order. The first one that returns
//! at least one element wins; failures and empty results are logged and the
//! next strategy is tried. When every strategy is exhausted the result is an
//! empty element list, never an error.

use std::sync::Arc;

use tracing::{info, warn};

use super::types::{ExtractOptions, ExtractionStrategy, PageElement};

/// Runs registered extraction strategies in order until one yields content.
pub struct DocumentExtractor {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy to the end of the chain.
    pub fn with_strategy(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract elements from `document`, falling through the chain on
    /// failure or empty output.
    pub async fn extract(
        &self,
        document: &[u8],
        filename: &str,
        options: &ExtractOptions,
    ) -> Vec<PageElement> {
        for strategy in &self.strategies {
            match strategy.extract(document, filename, options).await {
                Ok(elements) if !elements.is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        elements = elements.len(),
                        "Extraction succeeded"
                    );
                    return elements;
                }
                Ok(_) => {
                    warn!(strategy = strategy.name(), "Strategy returned no content");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Strategy failed");
                }
            }
        }

        warn!(filename, "All extraction strategies exhausted without content");
        Vec::new()
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}
