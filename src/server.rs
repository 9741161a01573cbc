//! HTTP tool API
//!
//! Fixed JSON routes over [`Gateway`]. Tool results always come back as
//! `200 OK`; success or failure is carried in the body's `status` field.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::backend::QueryFilter;
use crate::deletion::DeletionResponse;
use crate::records::DEFAULT_CNAME_TTL;
use crate::tools::discovery::{tool_categories, USAGE_GUIDE, VERSION};
use crate::tools::{AddResponse, BackendResult, Gateway, ToolCategory, ToolInfo};

// ============================================================
// Tool Arguments
// ============================================================

#[derive(Debug, Default, Deserialize)]
struct TargetsArgs {
    piholes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AddARecordArgs {
    host: String,
    ip: String,
    pihole: Option<String>,
}

fn default_ttl() -> u32 {
    DEFAULT_CNAME_TTL
}

#[derive(Debug, Deserialize)]
struct AddCnameRecordArgs {
    host: String,
    target: String,
    #[serde(default = "default_ttl")]
    ttl: u32,
    pihole: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveRecordArgs {
    host: String,
    confirm: Option<String>,
    pihole: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListQueriesArgs {
    piholes: Option<Vec<String>>,
    length: Option<u32>,
    from_ts: Option<i64>,
    until_ts: Option<i64>,
    upstream: Option<String>,
    domain: Option<String>,
    client_filter: Option<String>,
    cursor: Option<String>,
}

impl ListQueriesArgs {
    fn into_parts(self) -> (Option<Vec<String>>, QueryFilter) {
        let filter = QueryFilter {
            length: self.length,
            from_ts: self.from_ts,
            until_ts: self.until_ts,
            upstream: self.upstream,
            domain: self.domain,
            client: self.client_filter,
            cursor: self.cursor,
        };
        (self.piholes, filter)
    }
}

// ============================================================
// Router
// ============================================================

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/resources/piholes", get(piholes))
        .route("/api/resources/version", get(version))
        .route("/api/resources/guide", get(guide))
        .route("/api/resources/tools", get(list_tool_categories))
        .route("/api/resources/tools/:category", get(list_category_tools))
        .route("/api/tools/list_local_dns", post(list_local_dns))
        .route("/api/tools/add_local_a_record", post(add_local_a_record))
        .route("/api/tools/add_local_cname_record", post(add_local_cname_record))
        .route("/api/tools/remove_local_a_record", post(remove_local_a_record))
        .route(
            "/api/tools/remove_local_cname_record",
            post(remove_local_cname_record),
        )
        .route("/api/tools/list_queries", post(list_queries))
        .route("/api/tools/list_query_suggestions", post(list_query_suggestions))
        .route("/api/tools/list_query_history", post(list_query_history))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn health_check(State(gateway): State<Arc<Gateway>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "pihole-gateway",
        "version": VERSION,
        "piholes": gateway.backends().len(),
        "pending_deletions": gateway.deletions().tokens().len(),
    }))
}

async fn piholes(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    Json(gateway.piholes())
}

async fn version() -> Json<Value> {
    Json(json!({ "version": VERSION }))
}

async fn guide() -> Json<Value> {
    Json(json!({ "name": "pihole_usage_guide", "guide": USAGE_GUIDE }))
}

async fn list_tool_categories() -> Json<Vec<ToolInfo>> {
    Json(tool_categories())
}

async fn list_category_tools(Path(category): Path<String>) -> Response {
    match ToolCategory::parse(&category) {
        Some(category) => Json(category.tools()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Category '{}' not found", category) })),
        )
            .into_response(),
    }
}

async fn list_local_dns(
    State(gateway): State<Arc<Gateway>>,
    args: Option<Json<TargetsArgs>>,
) -> Json<Vec<BackendResult>> {
    let args = args.map(|Json(a)| a).unwrap_or_default();
    Json(gateway.list_local_dns(args.piholes.as_deref()).await)
}

async fn add_local_a_record(
    State(gateway): State<Arc<Gateway>>,
    Json(args): Json<AddARecordArgs>,
) -> Json<AddResponse> {
    info!("Tool call: add_local_a_record {} -> {}", args.host, args.ip);
    Json(
        gateway
            .add_a_record(&args.host, &args.ip, args.pihole.as_deref())
            .await,
    )
}

async fn add_local_cname_record(
    State(gateway): State<Arc<Gateway>>,
    Json(args): Json<AddCnameRecordArgs>,
) -> Json<AddResponse> {
    info!(
        "Tool call: add_local_cname_record {} -> {}",
        args.host, args.target
    );
    Json(
        gateway
            .add_cname_record(&args.host, &args.target, args.ttl, args.pihole.as_deref())
            .await,
    )
}

async fn remove_local_a_record(
    State(gateway): State<Arc<Gateway>>,
    Json(args): Json<RemoveRecordArgs>,
) -> Json<DeletionResponse> {
    info!(
        "Tool call: remove_local_a_record {} (confirm: {})",
        args.host,
        args.confirm.is_some()
    );
    Json(
        gateway
            .remove_a_record(&args.host, args.confirm.as_deref(), args.pihole.as_deref())
            .await,
    )
}

async fn remove_local_cname_record(
    State(gateway): State<Arc<Gateway>>,
    Json(args): Json<RemoveRecordArgs>,
) -> Json<DeletionResponse> {
    info!(
        "Tool call: remove_local_cname_record {} (confirm: {})",
        args.host,
        args.confirm.is_some()
    );
    Json(
        gateway
            .remove_cname_record(&args.host, args.confirm.as_deref(), args.pihole.as_deref())
            .await,
    )
}

async fn list_queries(
    State(gateway): State<Arc<Gateway>>,
    args: Option<Json<ListQueriesArgs>>,
) -> Json<Vec<BackendResult>> {
    let (piholes, filter) = args.map(|Json(a)| a).unwrap_or_default().into_parts();
    Json(gateway.list_queries(piholes.as_deref(), filter).await)
}

async fn list_query_suggestions(
    State(gateway): State<Arc<Gateway>>,
    args: Option<Json<TargetsArgs>>,
) -> Json<Vec<BackendResult>> {
    let args = args.map(|Json(a)| a).unwrap_or_default();
    Json(gateway.list_query_suggestions(args.piholes.as_deref()).await)
}

async fn list_query_history(
    State(gateway): State<Arc<Gateway>>,
    args: Option<Json<TargetsArgs>>,
) -> Json<Vec<BackendResult>> {
    let args = args.map(|Json(a)| a).unwrap_or_default();
    Json(gateway.list_query_history(args.piholes.as_deref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{backends, FakeBackend};
    use crate::tokens::TokenStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(primary: &Arc<FakeBackend>) -> Router {
        let gateway = Gateway::new(
            backends(vec![("primary", Arc::clone(primary))]),
            Arc::new(TokenStore::default()),
        );
        router(Arc::new(gateway))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_version() {
        let app = app(&Arc::new(FakeBackend::new()));

        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["piholes"], 1);

        let (_, body) = call(&app, "GET", "/api/resources/version", None).await;
        assert_eq!(body["version"], VERSION);
    }

    #[tokio::test]
    async fn test_guide_resource() {
        let app = app(&Arc::new(FakeBackend::new()));

        let (status, body) = call(&app, "GET", "/api/resources/guide", None).await;
        assert_eq!(status, StatusCode::OK);
        let guide = body["guide"].as_str().unwrap();
        assert!(guide.contains("confirmationToken"));
        assert!(guide.contains("remove_local_cname_record"));
    }

    #[tokio::test]
    async fn test_tool_catalogue_routes() {
        let app = app(&Arc::new(FakeBackend::new()));

        let (_, body) = call(&app, "GET", "/api/resources/tools/metrics", None).await;
        assert_eq!(body[0]["name"], "list_queries");

        let (status, body) = call(&app, "GET", "/api/resources/tools/bogus", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Category 'bogus' not found");
    }

    #[tokio::test]
    async fn test_delete_flow_over_http() {
        let primary = Arc::new(FakeBackend::new().with_hosts(&["10.0.0.1 foo.lan"]));
        let app = app(&primary);

        let (_, preview) = call(
            &app,
            "POST",
            "/api/tools/remove_local_a_record",
            Some(json!({ "host": "foo.lan" })),
        )
        .await;
        assert_eq!(preview["status"], "pending_deletion");
        let token = preview["confirmationToken"].as_str().unwrap().to_string();

        let (_, health) = call(&app, "GET", "/health", None).await;
        assert_eq!(health["pending_deletions"], 1);

        let (_, confirmed) = call(
            &app,
            "POST",
            "/api/tools/remove_local_a_record",
            Some(json!({ "host": "foo.lan", "confirm": token })),
        )
        .await;
        assert_eq!(confirmed["status"], "deleted");
        assert_eq!(confirmed["deleted"][0]["ip"], "10.0.0.1");
        assert!(primary.hosts().is_empty());

        let (_, replay) = call(
            &app,
            "POST",
            "/api/tools/remove_local_a_record",
            Some(json!({ "host": "foo.lan", "confirm": token })),
        )
        .await;
        assert_eq!(replay["status"], "invalid_token");
    }

    #[tokio::test]
    async fn test_add_cname_uses_default_ttl() {
        let primary = Arc::new(FakeBackend::new());
        let app = app(&primary);

        let (_, body) = call(
            &app,
            "POST",
            "/api/tools/add_local_cname_record",
            Some(json!({ "host": "www.lan", "target": "foo.lan" })),
        )
        .await;
        assert_eq!(body["status"], "added");
        assert_eq!(primary.cnames(), vec!["www.lan,foo.lan,300"]);
    }

    #[tokio::test]
    async fn test_list_tools_accept_empty_body() {
        let app = app(&Arc::new(FakeBackend::new()));

        let (status, body) = call(&app, "POST", "/api/tools/list_local_dns", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["pihole"], "primary");

        let (_, body) = call(
            &app,
            "POST",
            "/api/tools/list_queries",
            Some(json!({ "length": 5, "client_filter": "10.0.0.*" })),
        )
        .await;
        assert_eq!(body[0]["data"]["filter"]["length"], 5);
        assert_eq!(body[0]["data"]["filter"]["client"], "10.0.0.*");
    }
}
