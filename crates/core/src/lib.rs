//! Showroom Core - Shared types library.
//!
//! This crate provides the domain types used across Showroom components:
//! - `app` - Embedded Shopify admin, catalog API and public preview pages
//! - `cli` - Command-line tools for migrations and session management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. The preview gate decision lives here so it can be
//! tested without a server.
//!
//! # Modules
//!
//! - [`types`] - Shop domains, catalog ids, product snapshots, catalogs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
