use tracing::warn;

use crate::core::model::{AdRegion, Detection, DetectionBox, FusedDecision, ScrollOffset};

const UNKNOWN_CONFIDENCE: f32 = 0.5;

/// Lifts ad verdicts into page coordinates using the scroll offset at capture time.
/// Decisions without detector geometry cannot be located and are dropped, as are
/// boxes the resolver would reject.
pub fn lift(decisions: &[FusedDecision], capture_scroll: ScrollOffset) -> Vec<AdRegion> {
    decisions
        .iter()
        .filter(|decision| decision.is_ad)
        .filter_map(|decision| decision.detection_detail.as_ref())
        .filter(|detection| {
            let usable = is_usable(detection);
            if !usable {
                warn!(
                    label = %detection.class_label,
                    confidence = detection.confidence,
                    width = detection.bbox.width,
                    height = detection.bbox.height,
                    "skipping degenerate detection box"
                );
            }
            usable
        })
        .map(|detection| {
            let confidence = if detection.confidence > 0.0 {
                detection.confidence
            } else {
                UNKNOWN_CONFIDENCE
            };
            AdRegion {
                page_x: detection.bbox.x + capture_scroll.x,
                page_y: detection.bbox.y + capture_scroll.y,
                width: detection.bbox.width,
                height: detection.bbox.height,
                confidence,
            }
        })
        .collect()
}

fn is_usable(detection: &Detection) -> bool {
    let DetectionBox { x, y, width, height } = detection.bbox;
    [x, y, width, height, detection.confidence].iter().all(|v| v.is_finite())
        && width > 0.0
        && height > 0.0
        && detection.confidence <= 1.0
}
