//! HTTP surface.
//!
//! [`Router`] is a pure function of `(method, path, body)`; [`server`] only
//! moves bytes between it and may_minihttp.

pub mod router;
pub mod server;

pub use router::{ApiResponse, Router};
pub use server::{start, ApiService};
