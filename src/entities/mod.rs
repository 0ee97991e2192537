//! Record type definitions
//!
//! - [`Location`] - a node in the property hierarchy (building, room, shelf, ...)
//! - [`Item`] - something owned, optionally stored at a location

pub mod item;
pub mod location;

pub use item::Item;
pub use location::Location;
