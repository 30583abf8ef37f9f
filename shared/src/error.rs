//! Error types for the viewer core.
//!
//! Only asset loading surfaces errors to callers as a matter of course. Everything reachable
//! from the per-frame path is caught inside the frame and downgraded to a skipped frame.

use thiserror::Error;

/// Failure fetching or decoding a model list / model asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch `{path}`: {reason}")]
    Fetch { path: String, reason: String },

    #[error("model list at `{path}` is not a JSON array of strings: {source}")]
    ModelList {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model `{id}` could not be decoded: {reason}")]
    Decode { id: String, reason: String },
}

/// A mesh that cannot be turned into a collider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("mesh has no position attribute")]
    MissingPositions,

    #[error("non-indexed mesh has {0} vertices, which is not a multiple of three")]
    IncompleteTriangles(usize),

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("triangle mesh could not be built: {0}")]
    TriMesh(String),

    #[error("heightfield of {rows}x{cols} samples was given {samples} heights")]
    HeightField {
        rows: usize,
        cols: usize,
        samples: usize,
    },
}

/// Failure reading the RON configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Reported by a render backend when a draw cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("render surface is not available")]
    SurfaceLost,

    #[error("render backend error: {0}")]
    Backend(String),
}

/// Misuse of the viewer session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session has been disposed")]
    Disposed,

    #[error("model index {index} is out of range ({len} models available)")]
    NoSuchModel { index: usize, len: usize },
}
