//! Generative model gateway
//!
//! Boundary to the external generative AI service: image generation and
//! editing, chat, idea analysis, speech transcription, text-to-speech and
//! long-running video generation. The service is opaque, possibly slow and
//! possibly failing, reachable only through [`StickerGateway`]; failures
//! surface as typed [`GatewayError`] values, never as panics.

pub mod errors;
mod gemini;
pub mod models;
pub mod polling;
pub mod service;

pub use errors::GatewayError;
pub use gemini::GeminiClient;
pub use models::*;
pub use polling::poll_until_complete;
pub use service::*;
