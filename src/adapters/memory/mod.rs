//! In-memory document store
//!
//! Keeps every collection in ordered maps and optionally persists them to a
//! JSON snapshot on flush.

pub mod store;

pub use store::MemoryStore;
