//! Channel identifiers and keyed channel collections

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of one actuator channel (e.g. `servo1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Mapping channel id → value. Keys are fixed by configuration at startup;
/// iteration order carries no meaning.
pub type ChannelMap<T> = HashMap<ChannelId, T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_display() {
        let id = ChannelId::new("servo1");
        assert_eq!(id.to_string(), "servo1");
        assert_eq!(id.as_str(), "servo1");
    }

    #[test]
    fn test_channel_map_lookup_by_str() {
        let mut map: ChannelMap<f64> = ChannelMap::new();
        map.insert("servo2".into(), 0.5);
        assert_eq!(map.get("servo2"), Some(&0.5));
        assert!(map.get("servo3").is_none());
    }

    #[test]
    fn test_channel_id_serde_transparent() {
        let id = ChannelId::new("servo1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"servo1\"");
    }
}
