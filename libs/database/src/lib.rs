//! Database library providing the MongoDB connector and utilities
//!
//! This library provides a unified interface for connecting to and managing
//! MongoDB connections, with retry support and health checks.
//!
//! # Examples
//!
//! ```ignore
//! use database::mongodb;
//!
//! let client = mongodb::connect("mongodb://localhost:27017").await?;
//! let db = client.database("mydb");
//! let collection = db.collection::<Document>("items");
//! ```

pub mod common;
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
