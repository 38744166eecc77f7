//! # ocm-core
//!
//! Core types and utilities for working with the OpenShift Cluster Manager (OCM) API.
//!
//! This crate provides the shared error type, retry policy, HTTP client settings and
//! client configuration used by the OCM service clients.
//!
//! ## Modules
//!
//! - [`error`] - Error types, including the structured API error for non-2xx responses
//! - [`config`] - Serializable, validated configuration for OCM clients
//! - [`client`] - HTTP client settings and retry logic
//! - [`query`] - Query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;

// Re-export commonly used types
pub use error::{ApiError, Error, Result};
