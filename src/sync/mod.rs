//! Sync Module - the homeserver event feed.
//!
//! This module turns sync batches into state changes. It handles event
//! classification, sequential batch application and rejoin recovery.

pub mod classifier;
pub mod driver;
pub mod rejoin;

pub use classifier::{Classified, Classifier, Transition};
pub use driver::SyncDriver;
