use crate::core::model::ReasonCode;

pub const HIGH_CONFIDENCE: f32 = 0.7;
pub const UNCERTAIN_BELOW: f32 = 0.5;
pub const MODERATE_CONFIDENCE: f32 = 0.5;

/// Verdict table over (text, image) confidences. First matching row wins.
pub fn decide(nlp_confidence: f32, img_confidence: f32) -> ReasonCode {
    if nlp_confidence > HIGH_CONFIDENCE && img_confidence > HIGH_CONFIDENCE {
        ReasonCode::BothHighConfidence
    } else if nlp_confidence > HIGH_CONFIDENCE && img_confidence < UNCERTAIN_BELOW {
        ReasonCode::NlpHighImgUncertain
    } else if img_confidence > HIGH_CONFIDENCE && nlp_confidence < UNCERTAIN_BELOW {
        ReasonCode::ImgHighNlpUncertain
    } else if nlp_confidence > MODERATE_CONFIDENCE && img_confidence > MODERATE_CONFIDENCE {
        ReasonCode::BothModerate
    } else {
        ReasonCode::InsufficientConfidence
    }
}

pub fn is_ad(reason: ReasonCode) -> bool {
    !matches!(
        reason,
        ReasonCode::InsufficientConfidence | ReasonCode::Error
    )
}
