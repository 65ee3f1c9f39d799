pub mod decide;
pub mod pair;
pub mod regions;
pub mod wire;

use tracing::{debug, warn};

use crate::core::error::FusionError;
use crate::core::model::{Detection, FusedDecision, NlpDetail, TextOutcome};
use crate::fusion::pair::Pair;

pub trait FusionEngine {
    /// Total: never fails; faults degrade to a single `Error` decision.
    fn fuse(&self, detections: &[Detection], texts: &[TextOutcome]) -> Vec<FusedDecision>;
}

/// Fuses with the fixed confidence table in [`decide::decide`].
#[derive(Debug, Default)]
pub struct TableFusionEngine;

impl TableFusionEngine {
    pub fn new() -> Self {
        Self
    }
}

impl FusionEngine for TableFusionEngine {
    fn fuse(&self, detections: &[Detection], texts: &[TextOutcome]) -> Vec<FusedDecision> {
        fuse(detections, texts)
    }
}

pub fn fuse(detections: &[Detection], texts: &[TextOutcome]) -> Vec<FusedDecision> {
    match fuse_checked(detections, texts) {
        Ok(decisions) => decisions,
        Err(err) => {
            warn!(error = %err, "decision fusion failed");
            vec![FusedDecision::error(err.to_string())]
        }
    }
}

pub fn fuse_checked(
    detections: &[Detection],
    texts: &[TextOutcome],
) -> Result<Vec<FusedDecision>, FusionError> {
    validate(detections, texts)?;

    debug!(
        detections = detections.len(),
        texts = texts.len(),
        "fusing classifier results"
    );

    let (pairing, pairs) = pair::pair(detections, texts);
    debug!(?pairing, pairs = pairs.len(), "paired classifier streams");

    Ok(pairs
        .into_iter()
        .enumerate()
        .map(|(idx, pair)| fuse_pair(idx, pair))
        .collect())
}

fn validate(detections: &[Detection], texts: &[TextOutcome]) -> Result<(), FusionError> {
    if let Some(index) = detections
        .iter()
        .position(|detection| !detection.confidence.is_finite())
    {
        return Err(FusionError::NonFiniteDetection { index });
    }
    if let Some(index) = texts.iter().position(|text| {
        text.classification().is_some_and(|classification| {
            !classification.confidence.ad.is_finite() || !classification.confidence.non_ad.is_finite()
        })
    }) {
        return Err(FusionError::NonFiniteText { index });
    }
    Ok(())
}

fn fuse_pair(idx: usize, pair: Pair<'_>) -> FusedDecision {
    let nlp_detail = match pair.text {
        Some(TextOutcome::Classified(classification)) => NlpDetail::from(classification),
        Some(TextOutcome::Failed { text, error }) => {
            warn!(index = idx, text = %text, error = %error, "text classification failed, treating as absent");
            NlpDetail::absent()
        }
        None => NlpDetail::absent(),
    };

    let nlp_confidence = nlp_detail.ad_confidence;
    let img_confidence = pair.detection.map(|detection| detection.confidence).unwrap_or(0.0);
    let reason_code = decide::decide(nlp_confidence, img_confidence);
    let is_ad = decide::is_ad(reason_code);

    debug!(
        index = idx,
        is_ad,
        reason = %reason_code,
        nlp_confidence,
        img_confidence,
        "decision"
    );

    FusedDecision {
        is_ad,
        reason_code,
        nlp_detail,
        detection_detail: pair.detection.cloned(),
        error: None,
    }
}
