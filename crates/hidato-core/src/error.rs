/// Errors raised while building or parsing a [`Grid`](crate::Grid).
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GridError {
    /// The requested dimensions are zero or exceed [`Grid::MAX_SIDE`](crate::Grid::MAX_SIDE).
    #[display("invalid grid dimensions {rows}x{cols}")]
    InvalidDimensions {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },
    /// A row of a textual grid has a different width than the first row.
    #[display("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Row index.
        row: usize,
        /// Expected width.
        expected: usize,
        /// Actual width.
        found: usize,
    },
    /// A token of a textual grid is neither `.`, `#`, nor a positive number.
    #[display("invalid cell token {_0:?}")]
    InvalidToken(#[error(not(source))] String),
    /// An adjacency name could not be parsed.
    #[display("unknown adjacency {_0:?}")]
    UnknownAdjacency(#[error(not(source))] String),
    /// The open cells do not form a single connected component.
    #[display("open cells form {components} components")]
    Disconnected {
        /// Number of components found.
        components: usize,
    },
    /// The grid has no open cell.
    #[display("grid has no open cells")]
    NoOpenCells,
}
