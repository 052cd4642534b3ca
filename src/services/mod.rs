//! Business services
//!
//! - `auth`: credential hashing, token issuance/validation, the auth gate
//! - `catalog`: book validation, author resolution, CRUD and listing
//! - `import`: bulk import with per-row accounting

pub mod auth;
pub mod catalog;
pub mod import;
