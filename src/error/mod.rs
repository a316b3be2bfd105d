//! Error Handling Module
//!
//! This module provides the error types shared by every stage of the generation pipeline:
//! - `MediaError`, the single error type returned by validators, adapters and the reconciler
//! - `ErrorKind`, the coarse taxonomy surfaced to callers in a failed outcome
//! - `FieldErrors`, the field-level map produced by request validation
//!
//! # Example
//!
//! ```rust,ignore
//! use siumai_media::error::{ErrorKind, MediaError};
//! use siumai_media::types::Capability;
//!
//! let error = MediaError::api_error(401, "Unauthenticated");
//! assert_eq!(error.kind_for(Capability::ImageToVideo), ErrorKind::Unauthorized);
//! assert_eq!(error.kind_for(Capability::ImageToImage), ErrorKind::Configuration);
//! ```

mod conversions;
pub mod types;

pub use types::*;
