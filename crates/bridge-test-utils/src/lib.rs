//! Shared test utilities for the rule namespace bridge workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`recording`]: [`RecordingConfigCenter`], an in-memory config center
//!   that logs every call and can be told to fail
//! - [`fixtures`]: standard target, codec and engine setup

pub mod fixtures;
pub mod recording;

pub use recording::{Operation, RecordingConfigCenter, RemoteCall};
