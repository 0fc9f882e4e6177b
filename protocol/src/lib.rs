//! Shared wire types for the Moneta personal finance API.
//!
//! The API is a conventional JSON REST service rooted at `/api/v1/`. This
//! crate holds the request/response DTOs the client exchanges with it, split
//! into `api` (endpoint-shaped types) and `common` (domain records reused
//! across endpoints).

pub mod api;
pub mod common;

pub use api::*;
pub use common::*;
