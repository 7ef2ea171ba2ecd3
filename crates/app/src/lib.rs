//! Storefront application services.
//!
//! Async boundaries and orchestration around the pure [`decal`] domain:
//! the generative model gateway, microphone capture, the payment provider
//! seam and the top-level [`shop::Shop`] controller that owns all session
//! state.

pub mod audio;
pub mod capture;
pub mod config;
pub mod context;
pub mod export;
pub mod gateway;
pub mod logging;
pub mod payments;
pub mod receipt;
pub mod shop;
