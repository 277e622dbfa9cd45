//! Feature engineering.
//!
//! - fixed categorical vocabulary (`vocabulary`)
//! - feature vectors + ordered schema (`schema`)
//! - series grouping and lag features (`builder`)

pub mod builder;
pub mod schema;
pub mod vocabulary;

pub use builder::*;
pub use schema::*;
pub use vocabulary::*;
