use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::geometry::Rect;
use crate::dom::{NodeId, Viewport};

/// Detector box in image pixels, top-left anchored, aligned with the viewport at capture time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectionBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DetectionBox {
    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    #[serde(alias = "class", default)]
    pub class_label: String,
    pub confidence: f32,
    pub bbox: DetectionBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextLabel {
    Ad,
    #[serde(rename = "Non-Ad")]
    NonAd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LabelConfidence {
    #[serde(rename = "Ad")]
    pub ad: f32,
    #[serde(rename = "Non-Ad")]
    pub non_ad: f32,
}

impl LabelConfidence {
    /// Confidence used when a fragment is absent or its classification failed.
    pub const ABSENT: LabelConfidence = LabelConfidence { ad: 0.0, non_ad: 1.0 };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextClassification {
    pub text: String,
    #[serde(alias = "prediction")]
    pub predicted_label: TextLabel,
    pub confidence: LabelConfidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
}

impl TextClassification {
    pub fn non_ad(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            predicted_label: TextLabel::NonAd,
            confidence: LabelConfidence::ABSENT,
            region_id: None,
        }
    }
}

/// Result of asking the text classifier about one fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    Classified(TextClassification),
    Failed { text: String, error: String },
}

impl TextOutcome {
    pub fn classification(&self) -> Option<&TextClassification> {
        match self {
            TextOutcome::Classified(classification) => Some(classification),
            TextOutcome::Failed { .. } => None,
        }
    }

    pub fn region_id(&self) -> Option<&str> {
        self.classification()
            .and_then(|classification| classification.region_id.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    BothHighConfidence,
    NlpHighImgUncertain,
    ImgHighNlpUncertain,
    BothModerate,
    InsufficientConfidence,
    Error,
}

impl ReasonCode {
    pub fn description(&self) -> &'static str {
        match self {
            ReasonCode::BothHighConfidence => "Both models highly confident",
            ReasonCode::NlpHighImgUncertain => "NLP highly confident, Object Detection uncertain",
            ReasonCode::ImgHighNlpUncertain => "Object Detection highly confident, NLP uncertain",
            ReasonCode::BothModerate => "Both models moderately confident",
            ReasonCode::InsufficientConfidence => "Insufficient confidence from both models",
            ReasonCode::Error => "Error in decision process",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NlpDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_label: Option<TextLabel>,
    pub ad_confidence: f32,
    pub non_ad_confidence: f32,
}

impl NlpDetail {
    pub fn absent() -> Self {
        Self {
            text: None,
            predicted_label: None,
            ad_confidence: LabelConfidence::ABSENT.ad,
            non_ad_confidence: LabelConfidence::ABSENT.non_ad,
        }
    }
}

impl From<&TextClassification> for NlpDetail {
    fn from(classification: &TextClassification) -> Self {
        Self {
            text: Some(classification.text.clone()),
            predicted_label: Some(classification.predicted_label),
            ad_confidence: classification.confidence.ad,
            non_ad_confidence: classification.confidence.non_ad,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FusedDecision {
    pub is_ad: bool,
    pub reason_code: ReasonCode,
    pub nlp_detail: NlpDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_detail: Option<Detection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FusedDecision {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_ad: false,
            reason_code: ReasonCode::Error,
            nlp_detail: NlpDetail::absent(),
            detection_detail: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScrollOffset {
    pub x: f32,
    pub y: f32,
}

impl ScrollOffset {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A flagged region in page coordinates, independent of scroll position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdRegion {
    pub page_x: f32,
    pub page_y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl AdRegion {
    pub fn page_rect(&self) -> Rect {
        Rect::from_origin(self.page_x, self.page_y, self.width, self.height)
    }

    /// Where the region sits in the viewport given the current scroll position.
    pub fn viewport_rect(&self, scroll: ScrollOffset) -> Rect {
        self.page_rect().translate(-scroll.x, -scroll.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPath {
    Direct,
    Promoted,
    Descended,
    Fallback,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    NoCandidate,
    ProtectedWithoutAdChild,
    ProtectedTarget,
    AlreadyRemoved,
    CommitFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegionOutcome {
    Removed {
        node: NodeId,
        score: f32,
        path: RemovalPath,
        rect: Rect,
    },
    Filtered {
        reason: FilterReason,
    },
}

impl RegionOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RegionOutcome::Removed { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolutionReport {
    pub removed: usize,
    pub filtered: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<RegionOutcome>,
}

impl ResolutionReport {
    pub fn record(&mut self, outcome: RegionOutcome) {
        if outcome.is_removed() {
            self.removed += 1;
        } else {
            self.filtered += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// Everything one page analysis produced, as handed to exporters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub viewport: Viewport,
    #[serde(default)]
    pub decisions: Vec<FusedDecision>,
    #[serde(default)]
    pub regions: Vec<AdRegion>,
    pub resolution: ResolutionReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn region_shifts_into_viewport() {
        let region = AdRegion {
            page_x: 10.0,
            page_y: 900.0,
            width: 300.0,
            height: 250.0,
            confidence: 0.8,
        };
        let rect = region.viewport_rect(ScrollOffset::new(0.0, 800.0));
        assert_eq!(rect, Rect::new(10.0, 100.0, 310.0, 350.0));
    }

    #[test]
    fn parses_classifier_payload() {
        let json = serde_json::json!({
            "text": "Buy now",
            "prediction": "Ad",
            "confidence": { "Ad": 0.91, "Non-Ad": 0.09 }
        });
        let parsed: TextClassification = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.predicted_label, TextLabel::Ad);
        assert_eq!(parsed.confidence.ad, 0.91);
        assert!(parsed.region_id.is_none());
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = ResolutionReport::default();
        report.record(RegionOutcome::Filtered {
            reason: FilterReason::NoCandidate,
        });
        report.record(RegionOutcome::Removed {
            node: NodeId(3),
            score: -10.0,
            path: RemovalPath::Direct,
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
        });
        assert_eq!(report.removed, 1);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.outcomes.len(), 2);
    }
}
