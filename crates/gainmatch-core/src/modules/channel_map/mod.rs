mod parser;

use super::ChannelMapper;
use crate::domain::{ChannelInfo, GainMatchError, GainMatchResult};
use parser::parse_channel_records;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File-backed channel lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelMap {
    entries: BTreeMap<usize, ChannelInfo>,
}

impl ChannelMap {
    pub fn from_entries(entries: impl IntoIterator<Item = (usize, ChannelInfo)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn parse(source: &str) -> GainMatchResult<Self> {
        Ok(Self {
            entries: parse_channel_records(source)?,
        })
    }

    pub fn load(path: &Path) -> GainMatchResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            GainMatchError::configuration(
                "CONFIG.CHANNEL_MAP_FILE",
                format!(
                    "couldn't read channel map at '{}' ({}); check it exists",
                    path.display(),
                    source
                ),
            )
        })?;
        let map = Self::parse(&source)?;
        tracing::info!(path = %path.display(), channels = map.len(), "loaded channel map");
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ChannelMapper for ChannelMap {
    fn lookup(&self, channel: usize) -> Option<ChannelInfo> {
        self.entries.get(&channel).copied()
    }
}
