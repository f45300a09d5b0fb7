//! # Coffer Testkit
//!
//! Testing utilities for Coffer.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: An owner, an entry and a set of groups with keys, ready to
//!   seed a store with one share per group
//! - **Fault injection**: Store and cipher wrappers that fail on demand
//! - **Generators**: Proptest strategies for ids, keys, entry data and whole
//!   propagation scenarios
//!
//! ## Test Fixtures
//!
//! ```rust
//! use coffer_testkit::SharingFixture;
//!
//! let fixture = SharingFixture::new(3);
//! let keys = fixture.keys_except(&[fixture.group(2)]);
//! assert_eq!(keys.len(), 2);
//! ```
//!
//! ## Fault Injection
//!
//! ```rust
//! use coffer_store::MemoryStore;
//! use coffer_testkit::FaultyStore;
//!
//! let store = FaultyStore::new(MemoryStore::new());
//! store.set_fail_queries(true);
//! ```

pub mod faulty;
pub mod fixtures;
pub mod generators;

pub use faulty::{FaultyCipher, FaultyStore};
pub use fixtures::SharingFixture;
pub use generators::{PropagationScenario, ShareFate};
