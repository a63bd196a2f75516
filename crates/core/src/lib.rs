//! RocketShoes Core - Shared cart types.
//!
//! This crate provides the types shared by every RocketShoes component:
//! - `storefront` - Cart store, oracle client and the JSON surface for UI bindings
//! - `cli` - Command-line binding over the same store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Cart invariants (unique ids, non-zero amounts) are enforced here so that
//! every consumer, including deserialization of a persisted cart, gets them
//! for free.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, cart line items and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
