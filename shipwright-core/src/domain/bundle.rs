//! App bundle domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of everything the builder needs to know about one app
///
/// Assembled by the content management side of the platform and handed to
/// the build pipeline as an immutable value. Only the named sub-fields are
/// interpreted; any other top-level field is carried along untouched so the
/// CI dispatch payload mirrors what the caller sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppBundle {
    /// The app record itself (name, identifiers, store metadata, ...)
    #[serde(default)]
    pub app: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppBundle {
    /// Returns the app identifier as a plain string
    ///
    /// The identifier may arrive as a string, a number, or a document-store
    /// object id (`{"$oid": "..."}`). Returns `None` when `app.id` is absent,
    /// null, or empty.
    pub fn app_id(&self) -> Option<String> {
        self.app
            .get("id")
            .and_then(stringify_id)
            .filter(|id| !id.is_empty())
    }

    /// Returns the human readable app name, if present
    pub fn app_name(&self) -> Option<&str> {
        self.app
            .get("appName")
            .or_else(|| self.app.get("name"))
            .and_then(Value::as_str)
    }
}

/// Coerces an identifier value into its plain string form
pub fn stringify_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}
