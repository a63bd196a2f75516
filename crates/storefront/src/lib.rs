//! RocketShoes Storefront library.
//!
//! This crate provides the cart store and its bindings as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Modules
//!
//! - [`cart`] - The cart store and the notifying handle UI bindings hold
//! - [`api`] - Stock and catalog oracles (HTTP client + traits)
//! - [`storage`] - Key-value blob stores and the cart persistence adapter
//! - [`notify`] - Notification sinks for shopper-facing messages
//! - [`routes`] - JSON surface for storefront UI bindings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod state;
pub mod storage;
