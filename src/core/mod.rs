pub mod config;
pub mod types;

pub use config::PipelineConfig;
pub use types::{CommandError, ControlCommand, PredictionResult, Sample};
