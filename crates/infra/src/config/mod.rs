//! Persistent settings with change notification

pub mod store;

pub use store::ConfigStore;
