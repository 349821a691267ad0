use std::fmt::{Display, Formatter, Result};

use crate::checkpoint::model::RestoreCheckpoint;

impl Display for RestoreCheckpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "[{}, {}) at {}",
            self.restore_range_start, self.restore_range_end, self.being_block
        )
    }
}
