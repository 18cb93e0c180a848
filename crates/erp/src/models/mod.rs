//! Raw request and response types shared by the adapters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical upstream collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Entities,
    Contracts,
    Installments,
    Payables,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Contracts => "contracts",
            Self::Installments => "installments",
            Self::Payables => "payables",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchFilters {
    pub entity_id: Option<String>,
    /// Ask for upstream-computed present values. Sources may ignore it.
    pub expand: bool,
}

impl FetchFilters {
    pub fn for_entity(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            expand: false,
        }
    }

    pub fn expanded(mut self) -> Self {
        self.expand = true;
        self
    }
}

/// One upstream record, untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Value);

impl RawRecord {
    /// Upstream id as a string, whether sent as a string or a number.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Whether a batch carries the expanded present-value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    Minimal,
    Expanded,
}

impl ResponseShape {
    /// Inspects the records instead of trusting the request parameter.
    pub fn detect(records: &[RawRecord]) -> Self {
        let expanded = records
            .iter()
            .any(|r| r.0.get("presentValue").map(Value::is_object).unwrap_or(false));
        if expanded {
            Self::Expanded
        } else {
            Self::Minimal
        }
    }
}
