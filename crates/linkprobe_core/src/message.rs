use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::CheckResult;

/// A frame sent from the server to the client during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    Result(CheckResult),
    /// Terminal frame, serialized as `{"status":"done"}`.
    Done,
}

impl SessionMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for SessionMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SessionMessage::Result(result) => result.serialize(serializer),
            SessionMessage::Done => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", "done")?;
                map.end()
            }
        }
    }
}
