//! Client side of the recommendation service contract.
//!
//! - [`client::ApiClient`] issues requests and decodes JSON.
//! - [`types`] holds the request/response payloads.
//! - [`multipart`] encodes the CSV upload form.
//! - [`error::TransportError`] classifies failures (HTTP, network, decode).

pub mod client;
pub mod error;
pub mod multipart;
pub mod types;

pub use client::{ApiClient, Body, Method};
pub use error::TransportError;
