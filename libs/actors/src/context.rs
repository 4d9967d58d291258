//! Owner identity
//!
//! Opaque identifier naming the logical owner an actor serves. Only ever
//! compared for equality when filtering envelopes and addressing responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner identity: a number or a name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextId {
    Id(u64),
    Name(String),
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextId::Id(id) => write!(f, "{}", id),
            ContextId::Name(name) => f.write_str(name),
        }
    }
}

impl Default for ContextId {
    fn default() -> Self {
        ContextId::Id(0)
    }
}

impl From<u64> for ContextId {
    fn from(id: u64) -> Self {
        ContextId::Id(id)
    }
}

impl From<&str> for ContextId {
    fn from(name: &str) -> Self {
        ContextId::Name(name.to_string())
    }
}

impl From<String> for ContextId {
    fn from(name: String) -> Self {
        ContextId::Name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_serde() {
        assert_eq!(serde_json::to_string(&ContextId::from(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&ContextId::from("map-a")).unwrap(), "\"map-a\"");

        let id: ContextId = serde_json::from_str("12").unwrap();
        assert_eq!(id, ContextId::Id(12));
        let name: ContextId = serde_json::from_str("\"worker\"").unwrap();
        assert_eq!(name, ContextId::Name("worker".into()));
    }

    #[test]
    fn test_number_and_name_never_equal() {
        assert_ne!(ContextId::from(1), ContextId::from("1"));
        assert_eq!(ContextId::from(1).to_string(), ContextId::from("1").to_string());
    }
}
