//! Admin endpoint handlers.

pub mod system;
