//! In-memory storage implementations.

pub mod clients;

pub use clients::MemoryClientStore;
