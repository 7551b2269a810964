pub mod adapter;
pub mod kv;
pub mod remote;
pub mod selector;
pub mod sqlite;

pub use adapter::{EntityKind, Filter, Scope, StorageAdapter};
