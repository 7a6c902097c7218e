//! HTTP demo subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → example.rs (action through the demo circuit)
//!       or admin (registry inspection)
//!     → JSON response
//! ```

pub mod example;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
