pub mod config;
pub mod store;

pub use config::{CheckoutSettings, KioskConfig, SheetProduct, StorageSettings};
pub use store::{ConfigError, ConfigStore};
