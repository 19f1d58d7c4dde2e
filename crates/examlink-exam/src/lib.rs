//! # examlink-exam
//!
//! The exam submission handler for the EXAMLINK service.
//!
//! This crate provides:
//! - Two-phase validation of answer documents (JSON Schema structure, then
//!   semantic rules the schema language cannot express)
//! - `ExamService`, the thin orchestration over `LinkService::consume` that
//!   records submissions and requests artifact generation
//! - Verify-gated, idempotent consent recording

pub mod service;
pub mod validate;

pub use service::ExamService;
pub use validate::validate_answers;
