use thiserror::Error;

/// Errors from drawable setup and drawing.
///
/// Setup failures are non-fatal by policy: the caller logs them and the
/// affected drawable stays unusable. Drawing through an uninitialized
/// drawable is a programming error and is rejected explicitly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Draw was requested before `init`, or after `teardown`.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),
    /// `init` was called on an already-initialized drawable.
    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),
    /// The mesh store handed to `init` contains no vertices.
    #[error("{0} has no vertices to draw")]
    EmptyMesh(&'static str),
}
