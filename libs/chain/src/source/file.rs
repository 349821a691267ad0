use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};

use crate::model::{BlockWithTransactions, Height};
use crate::source::handle::BlockSource;

/// Reads newline-delimited JSON units from a file. Blank lines are skipped,
/// later lines win over earlier ones for the same height.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    async fn load(&self) -> Result<BTreeMap<Height, BlockWithTransactions>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .wrap_err_with(|| format!("failed to read {}", self.path.display()))?;

        let mut units = BTreeMap::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let unit: BlockWithTransactions = serde_json::from_str(line)
                .wrap_err_with(|| format!("{}:{}", self.path.display(), line_no + 1))?;
            units.insert(unit.height(), unit);
        }

        tracing::debug!(path = %self.path.display(), units = units.len(), "Loaded block file");
        Ok(units)
    }
}

#[async_trait::async_trait]
impl BlockSource for FileSource {
    async fn latest_height(&self) -> Result<Option<Height>> {
        Ok(self.load().await?.last_key_value().map(|(height, _)| *height))
    }

    async fn fetch_range(&self, from: Height, to: Height) -> Result<Vec<BlockWithTransactions>> {
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(self.load().await?.range(from..to).map(|(_, unit)| unit.clone()).collect())
    }
}
