//! Record store implementations.

pub mod inmemory;

pub use inmemory::InMemoryRecordStore;
