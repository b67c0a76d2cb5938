//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`AffinityError`] covers the programmer errors the core can detect:
//! - Invalid property bindings (self-binding, binding cycles)
//! - Scene graph structural violations (cycles, removing a non-child)
//! - Stale renderer-native handles
//! - Engine settings validation and (de)serialization
//!
//! Everything here is synchronous, single-threaded state management; there is no
//! retry or partial-failure semantics.
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, AffinityError>`.
//!
//! ```rust,ignore
//! use affinity::errors::{AffinityError, Result};
//!
//! fn wire_up(a: &Real, b: &Real) -> Result<()> {
//!     a.bind_with_inverse(b)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::animation::PropertyId;

/// The main error type for the Affinity engine.
#[derive(Error, Debug)]
pub enum AffinityError {
    // ========================================================================
    // Property Binding Errors
    // ========================================================================
    /// A property was asked to mirror itself.
    #[error("Property {property} cannot be bound to itself")]
    SelfBinding { property: PropertyId },

    /// Installing the binding would close a loop of bindings.
    #[error("Binding {target} to {bound_to} would create a binding cycle")]
    CyclicBinding { target: PropertyId, bound_to: PropertyId },

    // ========================================================================
    // Tree Errors
    // ========================================================================
    /// An operation would break a tree shape (e.g. inserting an ancestor).
    #[error("Structural invariant violated: {0}")]
    StructuralInvariant(String),

    /// The node is not a child of the given group.
    #[error("Node '{child}' is not a child of group '{parent}'")]
    NotAChild { parent: String, child: String },

    /// A renderer-native handle no longer refers to a live node.
    #[error("Invalid native node handle")]
    InvalidNativeHandle,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings failed validation.
    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    /// JSON (de)serialization error.
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias for `Result<T, AffinityError>`.
pub type Result<T> = std::result::Result<T, AffinityError>;
