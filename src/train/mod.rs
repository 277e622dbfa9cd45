//! Model training.
//!
//! - seeded hold-out split (`split`)
//! - row collection, fitting and diagnostics (`trainer`)

pub mod split;
pub mod trainer;

pub use split::*;
pub use trainer::*;
