use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reconciliation marker stored as JSON in the host's `songs.comments` column
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMarker {
    pub backend_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<String>,
}

impl SyncMarker {
    /// Marker for a song synced right now
    pub fn now(backend_id: &str) -> Self {
        Self {
            backend_id: backend_id.to_string(),
            last_synced: Some(Local::now().to_rfc3339()),
        }
    }

    pub fn to_comment(&self) -> String {
        // Serializing two plain strings cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Read a marker back out of a comments value.
    ///
    /// Comments are free text owned by the host; anything that is not a JSON
    /// object with a non-empty `backendId` is not ours and yields `None`.
    pub fn parse(comments: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(comments).ok()?;
        let object = value.as_object()?;

        let backend_id = match object.get("backendId")? {
            Value::String(id) if !id.is_empty() => id.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let last_synced = object
            .get("lastSynced")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self { backend_id, last_synced })
    }
}
