//! # examlink-store
//!
//! In-memory reference implementations of the EXAMLINK store traits.
//!
//! ## Overview
//!
//! `InMemoryLinkStore` keeps every link behind one `Mutex` so the
//! conditional transition is a genuine compare-and-swap — the property the
//! whole single-use guarantee rests on. `InMemorySubmissionStore` and
//! `InMemoryConsentStore` enforce the 1:1 and per-kind-idempotency
//! invariants respectively.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use examlink_store::{InMemoryLinkStore, InMemorySubmissionStore};
//! use examlink_core::traits::LinkStore;
//!
//! let store = InMemoryLinkStore::new();
//! let id = store.create(link)?;
//! ```

pub mod memory;

pub use memory::{InMemoryConsentStore, InMemoryLinkStore, InMemorySubmissionStore};
