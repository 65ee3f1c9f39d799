use crate::core::model::{Detection, TextOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    ByIndex,
    ByRegionId,
}

/// One detection and the text outcome believed to describe the same region.
/// Either side may be missing.
#[derive(Debug, Clone, Copy)]
pub struct Pair<'a> {
    pub detection: Option<&'a Detection>,
    pub text: Option<&'a TextOutcome>,
}

/// Joins the two streams by `region_id` when every detection and every
/// classified fragment carries one, otherwise by position.
pub fn pair<'a>(detections: &'a [Detection], texts: &'a [TextOutcome]) -> (Pairing, Vec<Pair<'a>>) {
    if keyed(detections, texts) {
        (Pairing::ByRegionId, pair_by_region_id(detections, texts))
    } else {
        (Pairing::ByIndex, pair_by_index(detections, texts))
    }
}

fn keyed(detections: &[Detection], texts: &[TextOutcome]) -> bool {
    let classified = texts.iter().filter(|text| text.classification().is_some());
    !detections.is_empty()
        && detections.iter().all(|detection| detection.region_id.is_some())
        && classified.clone().count() > 0
        && classified.into_iter().all(|text| text.region_id().is_some())
}

fn pair_by_index<'a>(detections: &'a [Detection], texts: &'a [TextOutcome]) -> Vec<Pair<'a>> {
    let len = detections.len().max(texts.len());
    (0..len)
        .map(|idx| Pair {
            detection: detections.get(idx),
            text: texts.get(idx),
        })
        .collect()
}

fn pair_by_region_id<'a>(detections: &'a [Detection], texts: &'a [TextOutcome]) -> Vec<Pair<'a>> {
    let mut used = vec![false; texts.len()];
    let mut pairs = Vec::with_capacity(detections.len().max(texts.len()));

    for detection in detections {
        let found = texts.iter().enumerate().find(|(idx, text)| {
            !used[*idx] && text.region_id().is_some() && text.region_id() == detection.region_id.as_deref()
        });
        let text = match found {
            Some((idx, text)) => {
                used[idx] = true;
                Some(text)
            }
            None => None,
        };
        pairs.push(Pair {
            detection: Some(detection),
            text,
        });
    }

    // Failed outcomes carry no id; they are absent in keyed mode.
    for (idx, text) in texts.iter().enumerate() {
        if !used[idx] && text.classification().is_some() {
            pairs.push(Pair {
                detection: None,
                text: Some(text),
            });
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{DetectionBox, TextClassification};
    use pretty_assertions::assert_eq;

    fn detection(confidence: f32, region_id: Option<&str>) -> Detection {
        Detection {
            class_label: "ad".to_string(),
            confidence,
            bbox: DetectionBox {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 50.0,
            },
            region_id: region_id.map(str::to_string),
        }
    }

    fn text(ad: f32, region_id: Option<&str>) -> TextOutcome {
        let mut classification = TextClassification::non_ad("fragment");
        classification.confidence.ad = ad;
        classification.confidence.non_ad = 1.0 - ad;
        classification.region_id = region_id.map(str::to_string);
        TextOutcome::Classified(classification)
    }

    #[test]
    fn ragged_streams_pair_by_index() {
        let detections = vec![detection(0.9, None)];
        let texts = vec![text(0.1, None), text(0.2, None)];
        let (mode, pairs) = pair(&detections, &texts);
        assert_eq!(mode, Pairing::ByIndex);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].detection.is_some());
        assert!(pairs[1].detection.is_none());
    }

    #[test]
    fn region_ids_override_order() {
        let detections = vec![detection(0.9, Some("a")), detection(0.4, Some("b"))];
        let texts = vec![text(0.2, Some("b")), text(0.8, Some("a"))];
        let (mode, pairs) = pair(&detections, &texts);
        assert_eq!(mode, Pairing::ByRegionId);
        assert_eq!(pairs.len(), 2);
        let first = pairs[0].text.and_then(|t| t.classification()).unwrap();
        assert_eq!(first.confidence.ad, 0.8);
    }

    #[test]
    fn unmatched_keyed_text_is_appended() {
        let detections = vec![detection(0.9, Some("a"))];
        let texts = vec![text(0.8, Some("z"))];
        let (_, pairs) = pair(&detections, &texts);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].text.is_none());
        assert!(pairs[1].detection.is_none());
    }

    #[test]
    fn partial_ids_fall_back_to_index() {
        let detections = vec![detection(0.9, Some("a")), detection(0.9, None)];
        let texts = vec![text(0.8, Some("a"))];
        let (mode, _) = pair(&detections, &texts);
        assert_eq!(mode, Pairing::ByIndex);
    }
}
