use thiserror::Error;

/// Error taxonomy for the attach → execute → write-back pipeline. Parse and
/// Sql failures are terminal before any spreadsheet write; Surface failures
/// may leave earlier writes of the same plan applied (the snapshot is
/// re-derivable via reload).
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not attach to workbook: {0}")]
    Attachment(String),

    #[error("could not parse statement: {0}")]
    Parse(String),

    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("spreadsheet surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, Error>;
