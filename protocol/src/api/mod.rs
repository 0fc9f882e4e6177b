//! API DTOs module
//!
//! Data transfer objects organized by domain:
//! - `auth`: token acquisition, refresh, and user permissions
//! - `records`: CRUD payloads for finance records

pub mod auth;
pub mod records;

pub use auth::*;
pub use records::*;
