//! Library exports for authguard, shared between the binary and tests.

pub mod auth;
pub mod client;
pub mod config;
pub mod guard;
pub mod models;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
