pub mod connection;
pub mod documents;
pub mod kv;
pub mod migrate;
