pub mod drivers;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod types;

pub use registry::CharacteristicRegistry;
pub use traits::{BleCentral, BlePeripheral};
pub use types::{BleError, ControlHandle};
