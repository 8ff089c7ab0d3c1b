//! Autonomous routine library.
//!
//! - [`path`] - Path segments, path groups and the path-follow seam
//! - [`routines`] - The routine catalogue, built as combinator trees
//! - [`selector`] - Named routine options and on-demand assembly
//!
//! Routines are assembled right before the autonomous period. Every missing
//! input (unknown routine, missing path, path too short) fails at assembly
//! time and nothing is scheduled.

pub mod path;
pub mod routines;
pub mod selector;

pub use path::{PathFollow, PathFollowerFactory, PathGroup, PathSegment, ResolvedPath};
pub use routines::RoutineKind;
pub use selector::{AutoSelector, DEFAULT_OPTION, find_path};

use thiserror::Error;

use crate::combinator::CompositionError;

/// Routine assembly failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutineError {
    #[error("path {path:?} has {available} segments, segment {index} requested")]
    MissingPathSegment {
        path: String,
        index: usize,
        available: usize,
    },

    #[error("no path named {0:?}")]
    MissingPath(String),

    #[error("unknown routine {0:?}")]
    UnknownRoutine(String),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}
