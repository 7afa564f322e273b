//! Shopfront API library.
//!
//! REST backend for a small shop: bearer-token auth, a public catalog,
//! shopper orders and an admin console. The binary in `main.rs` wires this
//! library to `PostgreSQL`; tests drive [`routes::router`] over the
//! in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
