//! Utility modules for siumai-media
//!
//! This module contains small helpers shared by the pipeline stages.

pub mod cancel;
pub mod data_uri;

pub use cancel::{CancelHandle, new_cancel_handle};
pub use data_uri::DataUri;
