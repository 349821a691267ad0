use sqlx::Error;

/// Rows per multi-row INSERT, well under SQLite's bound parameter limit.
pub const INSERT_CHUNK_SIZE: usize = 200;

pub fn is_unique_violation(e: &Error) -> bool {
    match e {
        Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Heights above `i64::MAX` have no column value and are rejected.
pub fn height_to_i64(height: u64) -> Result<i64, Error> {
    i64::try_from(height)
        .map_err(|_| Error::Encode(format!("height {height} does not fit an INTEGER column").into()))
}
