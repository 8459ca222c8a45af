//! Bundled default roster used when no persisted file exists yet.

use crate::model::entry::RosterEntry;
use crate::repo::roster_repo::{decode_entry, StorageError, StoreResult};
use serde_json::Value;
use std::borrow::Cow;

const BUNDLED_SEED_JSON: &str = include_str!("../../assets/pessoas.json");

/// Default dataset in the persisted record shape, without scheduling fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDataset {
    raw: Cow<'static, str>,
}

impl SeedDataset {
    /// Dataset compiled into the core.
    pub fn bundled() -> Self {
        Self {
            raw: Cow::Borrowed(BUNDLED_SEED_JSON),
        }
    }

    /// Dataset supplied by the host, e.g. a platform asset.
    pub fn from_json(raw: impl Into<String>) -> Self {
        Self {
            raw: Cow::Owned(raw.into()),
        }
    }

    /// An empty roster.
    pub fn empty() -> Self {
        Self::from_json("[]")
    }

    /// Decodes the dataset into fresh entries with generated ids.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidSeed` when the dataset is not a JSON
    /// array or any record fails to decode.
    pub fn entries(&self) -> StoreResult<Vec<RosterEntry>> {
        let records: Vec<Value> = serde_json::from_str(&self.raw)
            .map_err(|err| StorageError::InvalidSeed(err.to_string()))?;
        records
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                decode_entry(value)
                    .map_err(|reason| StorageError::InvalidSeed(format!("record {index}: {reason}")))
            })
            .collect()
    }
}
