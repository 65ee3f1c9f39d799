//! Text classification of extracted fragments.

pub mod http;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::core::error::ClassifierError;
use crate::core::model::{TextClassification, TextOutcome};

pub use http::{HttpClassifierConfig, HttpTextClassifier};

/// Labels a single text fragment as Ad or Non-Ad.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<TextClassification, ClassifierError>;
}

/// Classifies every fragment concurrently and waits for all of them.
/// The result is index-aligned with `fragments`; a failed call keeps its slot.
pub async fn classify_all<C: TextClassifier + ?Sized>(classifier: &C, fragments: &[String]) -> Vec<TextOutcome> {
    let calls = fragments.iter().map(|text| async move {
        match classifier.classify(text).await {
            Ok(classification) => TextOutcome::Classified(classification),
            Err(err) => {
                warn!(text = %text, error = %err, "text classification failed");
                TextOutcome::Failed {
                    text: text.clone(),
                    error: err.to_string(),
                }
            }
        }
    });

    let outcomes = join_all(calls).await;
    debug!(
        fragments = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.classification().is_none()).count(),
        "classified fragments"
    );
    outcomes
}
