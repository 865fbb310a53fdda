//! Core types, port traits and the comment service for Quill.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage and cache backends implement [`store::CommentStore`] and
//! [`cache::Cache`]; the transport layer talks only to
//! [`service::CommentService`].

pub mod cache;
pub mod comment;
pub mod error;
pub mod service;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
