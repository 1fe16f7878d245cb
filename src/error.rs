use thiserror::Error;

// ---------------------------------------------------------------------------
// Schema errors – problems with the shape of an input table
// ---------------------------------------------------------------------------

/// Fatal problems with an input table's layout. Cell-level problems never end
/// up here; malformed numbers are coerced to NaN by the loader.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// One or more required columns are absent.
    #[error("Missing columns: {missing:?}\nExpected columns: {expected:?}\nColumns found: {found:?}")]
    MissingColumns {
        missing: Vec<String>,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// None of the accepted names for a value column is present.
    #[error("No column named any of {accepted:?}\nColumns found: {found:?}")]
    NoAlias {
        accepted: Vec<String>,
        found: Vec<String>,
    },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}
