//! Nexus Core - Shared domain types.
//!
//! This crate provides the common types used by the Nexus Commerce
//! storefront and its admin consoles:
//!
//! - [`types::id`] - Newtype wrappers for type-safe entity IDs
//! - [`types::role`] - The closed account role enumeration
//! - [`types::email`] - Validated email addresses
//! - [`types::token`] - The opaque bearer credential
//! - [`types::user`], [`types::product`], [`types::cart`] - API data models
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O and no HTTP clients. The
//! backend API is the authoritative owner of all of this data; these types
//! are the client-side representation of its JSON payloads.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
