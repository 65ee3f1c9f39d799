//! Tolerant decoding of raw classifier payloads.
//!
//! Malformed detector items are skipped. Malformed or errored text items keep
//! their slot as a failed outcome so positional pairing stays aligned.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::core::model::{Detection, DetectionBox, TextClassification, TextOutcome};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireDetection {
    Nested(Detection),
    Flat {
        #[serde(default)]
        class: String,
        confidence: f32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default, rename = "regionId")]
        region_id: Option<String>,
    },
}

impl From<WireDetection> for Detection {
    fn from(wire: WireDetection) -> Self {
        match wire {
            WireDetection::Nested(detection) => detection,
            WireDetection::Flat {
                class,
                confidence,
                x,
                y,
                width,
                height,
                region_id,
            } => Detection {
                class_label: class,
                confidence,
                bbox: DetectionBox { x, y, width, height },
                region_id,
            },
        }
    }
}

/// Accepts either a bare array of detections or a workflow response of the
/// shape `{"outputs": [{"predictions": {"predictions": [...]}}]}`.
pub fn parse_detections(payload: &Value) -> Vec<Detection> {
    let items = payload.as_array().or_else(|| {
        payload
            .pointer("/outputs/0/predictions/predictions")
            .and_then(Value::as_array)
    });

    let Some(items) = items else {
        warn!("detector payload is not a sequence, ignoring it");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match WireDetection::deserialize(item) {
            Ok(wire) => Some(Detection::from(wire)),
            Err(err) => {
                warn!(index = idx, error = %err, "skipping malformed detection");
                None
            }
        })
        .collect()
}

pub fn parse_text_outcomes(payload: &Value) -> Vec<TextOutcome> {
    let Some(items) = payload.as_array() else {
        warn!("text classifier payload is not a sequence, ignoring it");
        return Vec::new();
    };

    items.iter().map(parse_text_outcome).collect()
}

fn parse_text_outcome(item: &Value) -> TextOutcome {
    let text = item
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(error) = item.get("error") {
        let error = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return TextOutcome::Failed { text, error };
    }

    match TextClassification::deserialize(item) {
        Ok(classification) => TextOutcome::Classified(classification),
        Err(err) => TextOutcome::Failed {
            text,
            error: format!("malformed classification: {err}"),
        },
    }
}

/// Text fragments to classify, as a bare array of strings.
pub fn parse_fragments(payload: &Value) -> Vec<String> {
    match payload.as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        None => payload
            .pointer("/outputs/0/model_1")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    }
}
