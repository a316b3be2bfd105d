//! Core data types for the generation pipeline
//!
//! - `capability`: the two generation modes and their fixed parameters
//! - `request`: validated, typed generation requests
//! - `job`: provider job snapshots and the job state machine
//! - `outcome`: the normalized result handed back to callers

pub mod capability;
pub mod job;
pub mod outcome;
pub mod request;

pub use capability::{Capability, VideoDuration};
pub use job::{ErrorDetail, GenerationJob, JobStatus};
pub use outcome::{GenerationOutcome, MediaReference};
pub use request::GenerationRequest;

pub use crate::error::{ErrorKind, ResponseCategory};
