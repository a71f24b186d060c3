//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`TrellisError`] covers every failure mode of the
//! scene-graph core:
//! - Invalid hierarchy mutations (double parenting, parenting the root)
//! - Unknown attribute / uniform / setting names and mismatched data types
//! - Shader compilation and program linking failures
//! - Wrong node kinds handed to the renderer
//!
//! None of these are transient: there is no retry policy anywhere in the
//! engine, every error propagates synchronously to the caller.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, TrellisError>`.
//!
//! ```rust,ignore
//! use trellis::errors::{TrellisError, Result};
//!
//! fn build() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::gpu::ShaderStage;
use crate::scene::NodeKey;

/// The main error type for the Trellis engine.
#[derive(Error, Debug)]
pub enum TrellisError {
    // ========================================================================
    // Scene Graph Errors
    // ========================================================================
    /// Invalid parent/child mutation: attaching a node that already has a
    /// parent, giving the root a parent, or creating a cycle.
    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    /// The node key does not refer to a live node of this graph.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// A node or geometry of the wrong kind was passed to an operation.
    #[error("Type error: {0}")]
    Type(String),

    // ========================================================================
    // Resource Configuration Errors
    // ========================================================================
    /// Unknown attribute / uniform / setting name, missing or unsupported
    /// data type, or a shader variable the program does not declare.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ========================================================================
    // Shader Errors
    // ========================================================================
    /// Shader compilation failed. `log` carries the driver diagnostic.
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile {
        /// Stage of the shader that failed
        stage: ShaderStage,
        /// Driver diagnostic text
        log: String,
    },

    /// Program linking failed. Carries the driver diagnostic.
    #[error("Program link failed:\n{0}")]
    Link(String),

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The graphics device refused to create an object.
    #[error("Graphics device error: {0}")]
    Device(String),
}

impl TrellisError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Alias for `Result<T, TrellisError>`.
pub type Result<T> = std::result::Result<T, TrellisError>;
