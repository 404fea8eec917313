//! # Custody Testkit
//!
//! Testing utilities for the custody ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ready service plus enrolled users holding their keys
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use custody_testkit::fixtures::TestFixture;
//!
//! # tokio_test_block(async {
//! let fixture = TestFixture::new();
//! let (evan, identity) = fixture.enroll("evan").await;
//! let entry = fixture
//!     .service
//!     .record("evan", b"hello", &evan.sign("hello"))
//!     .await
//!     .unwrap();
//! assert_eq!(entry.identity, identity.id);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use custody_testkit::generators::SignedMessage;
//!
//! proptest! {
//!     #[test]
//!     fn signature_verifies(msg: SignedMessage) {
//!         prop_assert!(msg.verifies());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{users, TestFixture, TestUser};
pub use generators::SignedMessage;
