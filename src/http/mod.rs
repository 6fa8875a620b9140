//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → preflight.rs / landing.rs (answered locally)
//!     → context.rs (method, path, query, headers, body stream)
//!     → [security: auth gate, header sanitizer]
//!     → [routing: prefix match, URL rewrite]
//!     → forward.rs (streaming upstream call)
//!     → response.rs (status + headers + streamed body, CORS)
//!     → Send to client
//! ```

pub mod context;
pub mod cors;
pub mod forward;
pub mod landing;
pub mod preflight;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
