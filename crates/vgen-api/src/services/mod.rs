//! Business logic services.

pub mod readiness;

pub use readiness::{ReadinessService, ReadyPlayback};
