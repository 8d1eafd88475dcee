//! Class metadata - explicit registration tables instead of reflection
//!
//! Each constructible kind describes itself through a chain of
//! [`TypeLevel`]s (base behavior, intermediate behavior, concrete type), and
//! a [`Lineage`] binds a chain together: merged defaults, shorthand tables,
//! property annotations and lifecycle hooks, computed once and cached.

mod annotation;
mod lineage;

pub use annotation::{
    default_annotations_for, register_default_annotations, AnnotatedProperty, PropertyKind,
    PropertySpec,
};
pub use lineage::{ClassValues, Lineage, MergedMeta, TypeLevel};
