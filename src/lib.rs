#![forbid(unsafe_code)]

//! Public entry point for the reusable tokview crate.
//!
//! The crate hosts everything the backend binary needs: the TTL response
//! cache, the upstream record normalizer, the library tree builder and the
//! HTTP handler layer. Keeping the logic in the library makes each piece
//! testable without standing up a server.

pub mod cache;
pub mod config;
pub mod error;
pub mod library;
pub mod normalize;
pub mod server;
pub mod upstream;
