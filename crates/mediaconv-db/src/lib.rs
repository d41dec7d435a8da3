//! mediaconv database library
//!
//! Store traits for media items and conversion jobs, with in-memory and PostgreSQL
//! implementations.

pub mod db;

pub use db::*;
