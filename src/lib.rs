pub mod config;
pub mod errors;
pub mod modules;
pub mod store;

pub use config::settings::SweepConfig;
pub use store::{InventoryStore, MemoryStore, MongoStore};
