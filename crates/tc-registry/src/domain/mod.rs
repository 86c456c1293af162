//! # Domain Module
//!
//! Records, key scheme, value objects and invariants of the title registry.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod keys;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use keys::*;
pub use value_objects::*;
