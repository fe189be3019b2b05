//! Pokedex record service library.
//!
//! This crate primarily ships a `pokedex` binary, but we expose a library
//! surface to enable integration testing and reuse of the creature core.

pub mod api;
pub mod config;
pub mod creatures;
pub mod db;
pub mod state;
