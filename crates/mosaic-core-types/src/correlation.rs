//! Correlation types for resolution tracking
//!
//! A resolution pass rescans the host tree once; every log line emitted
//! while the pass runs carries the same `PassId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(String);

impl PassId {
    /// Generate a new random PassId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_id_generation() {
        let id1 = PassId::new();
        let id2 = PassId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_pass_id_display() {
        let id = PassId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_pass_ids_are_time_ordered() {
        let first = PassId::new();
        let second = PassId::new();
        assert!(first.as_str() < second.as_str());
    }

    #[test]
    fn test_serialization() {
        let id = PassId::from_string("pass-1".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pass-1\"");
        let deserialized: PassId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
