// Adapters layer: concrete implementations for external systems (storage, http, table files).

pub mod csv_table;
pub mod http;
pub mod storage;
