pub mod bus;
pub mod runtime;
pub mod session;
pub mod state;

pub use bus::{ControlRequest, Coordinator, DisplayEvent, PipelineEvent};
pub use runtime::Pipeline;
pub use session::IngestionSession;
pub use state::SessionState;
