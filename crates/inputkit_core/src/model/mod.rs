//! Values, model and view contracts touched by input handlers.
//!
//! # Responsibility
//! - Define the three-valued validation outcome and extracted input values.
//! - Define the keyed-setter model and cached-value view contracts.
//!
//! # Invariants
//! - Models are mutated only through named setters, never through
//!   synthesized expressions.
//! - A view never mutates its model.

pub mod attributes;
pub mod value;
pub mod view;
