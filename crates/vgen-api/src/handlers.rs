//! Request handlers.

pub mod assets;
pub mod health;
pub mod webhook;

pub use assets::*;
pub use health::*;
pub use webhook::*;
