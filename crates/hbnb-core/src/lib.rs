//! HBnB Core Library
//!
//! Error type, the persistence port both storage engines implement, and
//! password hashing.

// Re-export pure types from hbnb-types
pub use hbnb_types::*;

pub mod error;
#[cfg(feature = "crypto")]
pub mod password;
pub mod ports;

pub use error::{HbnbError, Result};
