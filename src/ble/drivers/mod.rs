pub mod btle;

pub use btle::{BtleCentral, BtlePeripheral};
