//! HTTP front end: the operator page and the scan endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use netwatch_core::{DeviceRecord, LifecycleState};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::service::{ScanOutcome, ScanService};

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

/// Shown when discovery did not resolve a name.
pub const UNKNOWN_NAME: &str = "unknown";
/// Shown when discovery did not report a hardware address.
pub const UNKNOWN_HARDWARE_ID: &str = "N/A";

/// Body of `POST /scan`.
#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub range: Option<String>,
}

/// Body returned by `POST /scan`.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub devices: Vec<DeviceView>,
    pub range_used: String,
}

/// A device as presented to the operator.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    pub address: String,
    pub display_name: String,
    pub hardware_id: String,
    pub lifecycle_state: LifecycleState,
    pub absence_streak: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl From<&DeviceRecord> for DeviceView {
    fn from(device: &DeviceRecord) -> Self {
        Self {
            address: device.address.to_string(),
            display_name: device
                .display_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            hardware_id: device
                .hardware_id
                .clone()
                .unwrap_or_else(|| UNKNOWN_HARDWARE_ID.to_string()),
            lifecycle_state: device.lifecycle_state(),
            absence_streak: device.absence_streak(),
            first_seen: device.first_seen,
            last_seen: device.last_seen,
        }
    }
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        Self {
            devices: outcome.devices.iter().map(DeviceView::from).collect(),
            range_used: outcome.range_used,
        }
    }
}

pub fn router(service: Arc<ScanService>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/scan", post(scan_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind `bind_addr` and serve until the process is stopped.
pub async fn serve(service: Arc<ScanService>, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn index_handler(State(service): State<Arc<ScanService>>) -> Html<String> {
    let target = service.current_target().await;
    Html(INDEX_TEMPLATE.replace("{{default_range}}", &escape_attr(&target)))
}

async fn scan_handler(
    State(service): State<Arc<ScanService>>,
    Json(request): Json<ScanRequest>,
) -> Json<ScanResponse> {
    let outcome = service.scan(request.range.as_deref()).await;
    Json(outcome.into())
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use netwatch_core::Responder;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::scanner::Discovery;

    struct ScriptedDiscovery {
        rounds: StdMutex<VecDeque<Vec<Responder>>>,
    }

    #[async_trait]
    impl Discovery for ScriptedDiscovery {
        async fn discover(&self, _range: &str) -> Vec<Responder> {
            self.rounds.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    fn app(rounds: Vec<Vec<Responder>>) -> Router {
        let discovery = Arc::new(ScriptedDiscovery {
            rounds: StdMutex::new(rounds.into()),
        });
        router(Arc::new(ScanService::new(discovery, "192.168.1.0/24")))
    }

    fn scan_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/scan")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_scan_fills_missing_metadata_placeholders() {
        let app = app(vec![vec![
            Responder::new(
                "10.0.0.5".parse().unwrap(),
                Some("host-a".into()),
                Some("AA:BB".into()),
            ),
            Responder::new("10.0.0.6".parse().unwrap(), None, None),
        ]]);

        let response = app
            .oneshot(scan_request(r#"{"range": "10.0.0.0/24"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["range_used"], "10.0.0.0/24");

        let devices = body["devices"].as_array().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["address"], "10.0.0.5");
        assert_eq!(devices[0]["display_name"], "host-a");
        assert_eq!(devices[0]["hardware_id"], "AA:BB");
        assert_eq!(devices[0]["lifecycle_state"], "ACTIVE");
        assert_eq!(devices[0]["absence_streak"], 0);
        assert_eq!(devices[1]["display_name"], UNKNOWN_NAME);
        assert_eq!(devices[1]["hardware_id"], UNKNOWN_HARDWARE_ID);
    }

    #[tokio::test]
    async fn test_scan_without_range_reuses_target() {
        let app = app(vec![]);

        let response = app.clone().oneshot(scan_request("{}")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["range_used"], "192.168.1.0/24");

        let response = app
            .clone()
            .oneshot(scan_request(r#"{"range": "10.9.0.0/16"}"#))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["range_used"], "10.9.0.0/16");

        let response = app
            .oneshot(scan_request(r#"{"range": null}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["range_used"], "10.9.0.0/16");
        assert!(body["devices"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quiet_then_removed_over_http() {
        let app = app(vec![vec![Responder::new(
            "10.0.0.5".parse().unwrap(),
            None,
            None,
        )]]);

        app.clone().oneshot(scan_request("{}")).await.unwrap();

        let body = json_body(app.clone().oneshot(scan_request("{}")).await.unwrap()).await;
        assert_eq!(body["devices"][0]["lifecycle_state"], "ABSENT_ONCE");
        assert_eq!(body["devices"][0]["absence_streak"], 1);

        let body = json_body(app.oneshot(scan_request("{}")).await.unwrap()).await;
        assert!(body["devices"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_shows_current_target() {
        let app = app(vec![]);
        app.clone()
            .oneshot(scan_request(r#"{"range": "10.2.0.0/24"}"#))
            .await
            .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"value="10.2.0.0/24""#));
        assert!(!html.contains("{{default_range}}"));
    }

    #[tokio::test]
    async fn test_non_json_body_rejected() {
        let response = app(vec![])
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scan")
                    .body(Body::from("range=10.0.0.0/24"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"10.0.0.0/24" onfocus="x"#),
            "10.0.0.0/24&quot; onfocus=&quot;x"
        );
        assert_eq!(escape_attr("<a&b>"), "&lt;a&amp;b&gt;");
    }
}
