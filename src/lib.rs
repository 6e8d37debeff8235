//! VGDL Permute: order-invariant training corpora from VGDL game descriptions.
//!
//! A game block's sections and the rows inside them carry no meaning in
//! their order. This crate turns one block into many equivalent renderings,
//! keeping each sprite's children attached to it, and pairs them with every
//! ordering of the game's trait phrases.

pub mod config;
pub mod core;
pub mod schema;
pub mod store;
