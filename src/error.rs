use thiserror::Error;

/// Errors returned by a tileset store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested file does not exist.
    ///
    /// Handlers recover from this locally, either by synthesizing a default
    /// or by probing the tileset status to pick the right 404.
    #[error("item not found")]
    NoItem,

    /// The resolved path escapes the configured tileset root
    #[error("path escapes tileset root: {0}")]
    PathTraversal(String),

    /// Any filesystem error other than not-exists
    #[error("I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Classify a filesystem error, mapping not-exists to [`StoreError::NoItem`].
    pub fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NoItem
        } else {
            StoreError::Io(err.to_string())
        }
    }
}

/// Errors produced when parsing tile coordinates from a request path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("invalid {axis} coordinate `{value}`: expected an unsigned decimal integer")]
    InvalidComponent { axis: &'static str, value: String },

    #[error("unknown tile resource `{0}`: expected `{{y}}.terrain`")]
    UnknownResource(String),
}

/// Errors produced when parsing a byte-size option such as `5MB`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteSizeError {
    #[error("size cannot be empty")]
    Empty,

    #[error("size cannot be negative: {0}")]
    Negative(String),

    #[error("the size must be a number optionally suffixed with a unit e.g. 5MB: {0}")]
    InvalidNumber(String),

    #[error("bad size suffix: {0}")]
    UnknownSuffix(String),

    #[error("size does not fit in 64 bits: {0}")]
    Overflow(String),
}

/// Errors surfaced to HTTP clients by the tileset handlers.
#[derive(Debug, Clone, Error)]
pub enum TerrainError {
    /// Path parameters could not be parsed (400)
    #[error("{0}")]
    InvalidCoord(#[from] CoordError),

    /// The request tried to reach outside the tileset root (400)
    #[error("invalid tileset path: {0}")]
    PathTraversal(String),

    /// The tileset directory does not exist (404)
    #[error("The tileset `{tileset}` does not exist")]
    TilesetNotFound { tileset: String },

    /// The tile file is absent and is not a root tile (404)
    #[error("The terrain tile does not exist")]
    TileNotFound,

    /// The tileset exists but has no metadata document (404)
    #[error("The metadata for tileset `{tileset}` does not exist")]
    MetadataNotFound { tileset: String },

    /// Filesystem failure other than not-exists (500)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<StoreError> for TerrainError {
    fn from(err: StoreError) -> Self {
        match err {
            // Callers translate NoItem before it reaches here; anything left
            // over is a genuine missing tile.
            StoreError::NoItem => TerrainError::TileNotFound,
            StoreError::PathTraversal(path) => TerrainError::PathTraversal(path),
            StoreError::Io(message) => TerrainError::Io(message),
        }
    }
}
