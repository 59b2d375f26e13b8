//! Infrastructure layer: storage backends, CSV ingestion, configuration.

pub mod config;
pub mod csv_import;
pub mod postgres;
pub mod store;

pub use config::{AppConfig, ConfigError, StorageConfig};
pub use csv_import::{CsvImportError, read_rows};
pub use postgres::{PgInvoiceStore, PgPartyStore, PgProductStore, PgStore, connect};
pub use store::{InMemoryStore, RecordStore, StoreError};
