//! Generic, format-agnostic document trees.
//!
//! Both trees share one conceptual shape (scalars, ordered maps/lists)
//! with typed accessors; the format mappers in
//! [`format`](crate::xword::format) translate them into the domain model.

pub mod json;
pub mod xml;
