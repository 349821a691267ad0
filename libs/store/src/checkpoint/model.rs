use sqlx::FromRow;

/// Progress of the last gap scan. There is at most one row.
#[derive(Clone, Copy, Debug, FromRow, PartialEq, Eq)]
pub struct RestoreCheckpoint {
    pub restore_range_start: i64,
    pub restore_range_end: i64,
    pub being_block: i64,
}
