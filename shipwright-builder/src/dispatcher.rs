//! Build dispatcher
//!
//! Sends the single trigger event that starts a remote build. The whole app
//! bundle travels as the event payload. Failures are not retried here.

use shipwright_core::domain::bundle::AppBundle;
use tracing::info;

use crate::ci::{CiClient, CiError};
use crate::error::{BuildError, Result};

/// Triggers a remote build for `bundle`
///
/// # Arguments
/// * `ci` - CI client used to send the event
/// * `event_type` - Event name the build workflow listens for
/// * `bundle` - App bundle sent as the event payload
pub async fn dispatch_build(ci: &dyn CiClient, event_type: &str, bundle: &AppBundle) -> Result<()> {
    let payload = serde_json::to_value(bundle)
        .map_err(|e| BuildError::Packaging(format!("failed to serialize bundle: {}", e)))?;

    match ci.dispatch(event_type, &payload).await {
        Ok(()) => {
            info!(
                "Dispatched '{}' build for app {}",
                event_type,
                bundle.app_id().unwrap_or_default()
            );
            Ok(())
        }
        Err(CiError::MissingToken) => Err(BuildError::Authentication(
            "a CI access token is required to dispatch builds".to_string(),
        )),
        Err(e) if e.is_unauthorized() => Err(BuildError::Authentication(format!(
            "the CI system rejected the access token: {}",
            e
        ))),
        Err(e) if e.is_not_found() => Err(BuildError::Configuration(format!(
            "build repository not found or not visible to the token: {}",
            e
        ))),
        Err(e) => Err(BuildError::Dispatch(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value as JsonValue, json};
    use shipwright_core::domain::run::{Artifact, RemoteRun};
    use std::sync::Mutex;

    /// Records dispatches and answers with a fixed status
    struct RecordingCi {
        status: Option<u16>,
        missing_token: bool,
        sent: Mutex<Vec<(String, JsonValue)>>,
    }

    impl RecordingCi {
        fn new(status: Option<u16>, missing_token: bool) -> Self {
            Self {
                status,
                missing_token,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CiClient for RecordingCi {
        async fn dispatch(&self, event_type: &str, payload: &JsonValue) -> crate::ci::Result<()> {
            if self.missing_token {
                return Err(CiError::MissingToken);
            }
            if let Some(status) = self.status {
                return Err(CiError::api_error(status, "rejected"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((event_type.to_string(), payload.clone()));
            Ok(())
        }

        async fn list_runs(&self) -> crate::ci::Result<Vec<RemoteRun>> {
            Ok(Vec::new())
        }

        async fn get_run(&self, run_id: u64) -> crate::ci::Result<RemoteRun> {
            Err(CiError::api_error(404, format!("run {} not found", run_id)))
        }

        async fn list_artifacts(&self, _run_id: u64) -> crate::ci::Result<Vec<Artifact>> {
            Ok(Vec::new())
        }

        fn artifact_url(&self, run_id: u64, artifact_id: u64) -> String {
            format!("runs/{}/artifacts/{}", run_id, artifact_id)
        }
    }

    fn bundle() -> AppBundle {
        serde_json::from_value(json!({
            "app": { "id": "abc123", "appName": "Demo" },
            "design": { "theme": "dark" },
            "locale": "en"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_sends_whole_bundle() {
        let ci = RecordingCi::new(None, false);

        dispatch_build(&ci, "build_app", &bundle()).await.unwrap();

        let sent = ci.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "build_app");
        assert_eq!(sent[0].1["app"]["appName"], json!("Demo"));
        assert_eq!(sent[0].1["design"]["theme"], json!("dark"));
        assert_eq!(sent[0].1["locale"], json!("en"));
    }

    #[tokio::test]
    async fn test_missing_token_is_authentication_error() {
        let ci = RecordingCi::new(None, true);
        let result = dispatch_build(&ci, "build_app", &bundle()).await;
        assert!(matches!(result, Err(BuildError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_rejected_token_is_authentication_error() {
        for status in [401, 403] {
            let ci = RecordingCi::new(Some(status), false);
            let result = dispatch_build(&ci, "build_app", &bundle()).await;
            assert!(matches!(result, Err(BuildError::Authentication(_))), "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_unknown_repository_is_configuration_error() {
        let ci = RecordingCi::new(Some(404), false);
        let result = dispatch_build(&ci, "build_app", &bundle()).await;
        assert!(matches!(result, Err(BuildError::Configuration(msg)) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_rejected_dispatch_is_dispatch_error() {
        let ci = RecordingCi::new(Some(422), false);
        let result = dispatch_build(&ci, "build_app", &bundle()).await;
        assert!(matches!(
            result,
            Err(BuildError::Dispatch(CiError::ApiError { status: 422, .. }))
        ));
    }
}
