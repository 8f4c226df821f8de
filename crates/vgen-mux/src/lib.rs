//! Client for the Mux Video API.
//!
//! This crate provides:
//! - Asset retrieval, creation and playback-id provisioning over REST
//! - The status-check and playback collaborators used by `vgen-tracker`
//! - Verification of `Mux-Signature` webhook headers

pub mod client;
pub mod error;
pub mod signature;
pub mod types;

pub use client::{MuxClient, MuxConfig};
pub use error::{MuxError, MuxResult};
pub use signature::{
    compute_signature, format_signature_header, verify_webhook_signature, SIGNATURE_HEADER,
};
