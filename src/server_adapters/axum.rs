//! Axum router for the generation routes
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use siumai_media::pipeline::MediaPipeline;
//! use siumai_media::server_adapters::axum::router;
//!
//! let pipeline = Arc::new(MediaPipeline::builder().build()?);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router(pipeline)).await?;
//! ```
//!
//! A client that disconnects drops the handler future, which stops any pending poll wait.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use super::{IMAGE_TO_IMAGE_PATH, IMAGE_TO_VIDEO_PATH, ResponseOptions, http_response};
use crate::normalize::normalize_error;
use crate::pipeline::MediaPipeline;
use crate::types::Capability;
use crate::validation::parse_body;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<MediaPipeline>,
    options: Arc<ResponseOptions>,
}

/// Router with full error messages.
pub fn router(pipeline: Arc<MediaPipeline>) -> Router {
    router_with_options(pipeline, ResponseOptions::development())
}

/// Router rendering failures according to `options`.
pub fn router_with_options(pipeline: Arc<MediaPipeline>, options: ResponseOptions) -> Router {
    Router::new()
        .route(IMAGE_TO_IMAGE_PATH, post(image_to_image))
        .route(IMAGE_TO_VIDEO_PATH, post(image_to_video))
        .with_state(AppState {
            pipeline,
            options: Arc::new(options),
        })
}

async fn image_to_image(State(state): State<AppState>, body: Bytes) -> Response {
    handle(&state, Capability::ImageToImage, &body).await
}

async fn image_to_video(State(state): State<AppState>, body: Bytes) -> Response {
    handle(&state, Capability::ImageToVideo, &body).await
}

async fn handle(state: &AppState, capability: Capability, body: &[u8]) -> Response {
    let outcome = match parse_body(body) {
        Ok(value) => state.pipeline.generate(capability, &value).await,
        Err(error) => normalize_error(capability, &error),
    };
    let (status, body) = http_response(capability, &outcome, &state.options);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
