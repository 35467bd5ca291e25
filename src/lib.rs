//! ktdash: operator console for a knowledge-tracing recommendation service.
//!
//! Each operator action (upload, recommend, metrics, drift, cache stats,
//! uncertainty, health) is one HTTP call whose lifecycle is tracked by its
//! own controller and rendered into its own output region.

pub mod actions;
pub mod analytics;
pub mod api;
pub mod chart;
pub mod cli;
pub mod config;
pub mod render;
pub mod theme;
