//! Property value model.
//!
//! This module provides the tagged value tree exchanged with the host engine
//! and its JSON wire encoding:
//! - [`PropertyValue`] and [`PropertyMap`]
//! - Marker-object encoding for secrets, assets and unknowns
//! - Path formatting shared by the diff engine and config flattening

pub mod path;
mod value;
pub mod wire;

pub use value::{PropertyMap, PropertyValue};
