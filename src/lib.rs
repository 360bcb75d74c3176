#![cfg_attr(feature = "nightly", feature(core_intrinsics))]

/// Index width configuration
pub mod config;
/// Hashing strategies and hash utilities
pub mod hash;
/// Map-style convenience surface
pub mod map;
/// Set-style convenience surface
pub mod set;
/// Open-addressing table engine
pub mod table;

/// Crate error types
mod error;
/// Set of compiler hints
mod hint;

pub use crate::config::{HashIdx, DEFAULT_LOAD_FACTOR, MISSING};
pub use crate::error::{HashError, Result};
pub use crate::hash::{Fx, Identity, KeyHash, PtrHash, Runtime, X31};
pub use crate::map::HashMap;
pub use crate::set::HashSet;
pub use crate::table::{Put, RawTable};
