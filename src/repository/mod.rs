//! Repository Layer
//!
//! Durable storage: database setup and the per-operation transactional
//! store adapter.

mod db;
mod store;


pub use db::{open, STATE_VERSION};
pub use store::Store;
