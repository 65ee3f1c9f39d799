use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("region {index} has non-finite geometry")]
    NonFiniteRegion { index: usize },

    #[error("region {index} has non-positive size {width}x{height}")]
    EmptyRegion { index: usize, width: f32, height: f32 },

    #[error("region {index} confidence {confidence} is outside [0, 1]")]
    ConfidenceOutOfRange { index: usize, confidence: f32 },

    #[error("malformed region list: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    #[error("detection {index} has non-finite confidence")]
    NonFiniteDetection { index: usize },

    #[error("text classification {index} has non-finite confidence")]
    NonFiniteText { index: usize },
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier response could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0:?} has no parent to hold a placeholder")]
    Detached(NodeId),
}
