pub mod ble;
pub mod core;
pub mod decode;
pub mod observability;
pub mod pipeline;
pub mod store;
pub mod workers;
