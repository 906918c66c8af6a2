//! Statistical language model used as a scoring signal

pub mod evaluator;
pub mod model;
pub mod persistence;

pub use evaluator::{FlowMode, FLOW_SCALE};
pub use model::{LanguageModel, SMOOTHING_ALPHA};
pub use persistence::{MAX_MODEL_FILE_SIZE, WRITE_BATCH_SIZE};
