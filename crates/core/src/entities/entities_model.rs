//! Entity domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Aggregation root of the canonical model (a development, a company).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    /// Derived on every resolution index refresh.
    pub active: bool,
    /// Upstream system the entity was read from.
    pub source: String,
    pub updated_at: NaiveDateTime,
}

/// Which entities a run processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "ids")]
pub enum EntityFilter {
    /// Every active entity.
    #[default]
    All,
    /// Only the listed entity ids (still subject to the active check).
    Ids(Vec<String>),
}

impl EntityFilter {
    pub fn ids(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Ids(ids.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, entity_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Ids(ids) => ids.iter().any(|id| id == entity_id),
        }
    }
}
