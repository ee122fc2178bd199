

pub mod config_store;
pub mod store;

pub use config_store::{ConfigStore, ConfigStoreError, FileConfigStore, MemoryConfigStore};
pub use store::{HttpQueryStore, QueryStore, ResultFormat, StoreError};
