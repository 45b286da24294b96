pub mod control;
pub mod inference;
pub mod persist;

pub use control::{ControlWriter, WriteError};
pub use inference::{InferenceError, InferenceWorker, LinearModel, TremorModel};
pub use persist::{CsvSink, PersistError, PersistenceWorker, SampleSink};
