//! Replicate provider
//!
//! - `client`: predictions API client, also the reconciler's job source
//! - `image`: synchronous image-to-image adapter
//! - `video`: asynchronous image-to-video adapter
//! - `types`: wire types

pub mod client;
pub mod image;
pub mod types;
pub mod video;

pub use client::{DEFAULT_BASE_URL, PreferWait, ReplicateClient};
pub use types::{Prediction, PredictionStatus};
