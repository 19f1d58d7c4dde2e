//! # examlink-core
//!
//! The link lifecycle state machine for the EXAMLINK service.
//!
//! This crate provides:
//! - The trait seams (`LinkStore`, `SubmissionStore`, `ConsentStore`,
//!   `CatalogResolver`, `ArtifactGenerator`, `Clock`)
//! - The `LinkService` that drives issue / verify / consume in the correct
//!   order, with the store's compare-and-swap as the only serialization point
//! - The prefill resolver over the immutable header snapshot
//! - TOML-driven `ServiceConfig`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use examlink_core::{LinkService, ServiceConfig, traits::SystemClock};
//! ```

pub mod config;
pub mod prefill;
pub mod service;
pub mod traits;

pub use config::ServiceConfig;
pub use service::LinkService;
