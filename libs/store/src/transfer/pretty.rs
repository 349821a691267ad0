use std::fmt::{Display, Formatter, Result};

use crate::transfer::model::Transfer;

impl Display for Transfer {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{} {} -> {} {}{} ({}) tx={}",
            self.func,
            self.from_address.as_deref().unwrap_or("-"),
            self.to_address.as_deref().unwrap_or("-"),
            self.amount,
            self.denom,
            self.token,
            self.tx_hash
        )
    }
}
