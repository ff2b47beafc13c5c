use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::docserver::handlers::{
    AppState, delete_document, get_document, health, list_documents, put_document,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/:collection", get(list_documents))
        .route(
            "/v1/:collection/:id",
            get(get_document).put(put_document).delete(delete_document),
        )
        .with_state(state)
}

/// Router with request tracing and permissive CORS
pub fn create_app(state: Arc<AppState>) -> Router {
    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docserver::models::DocumentList;
    use crate::docserver::open_state;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.db");
        let state = open_state(path.to_str().unwrap()).unwrap();
        (dir, create_app(state))
    }

    fn put(uri: &str, body: &str, precondition: Option<(&str, &str)>) -> Request<Body> {
        let mut builder = Request::put(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some((name, value)) = precondition {
            builder = builder.header(name, value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app();
        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let (_dir, app) = app();

        let (status, _) = send(&app, put("/v1/tournaments/t1", r#"{"name":"Cup"}"#, Some(("if-none-match", "*")))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, put("/v1/tournaments/t1", r#"{"name":"Other"}"#, Some(("if-none-match", "*")))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, _) = send(&app, put("/v1/tournaments/t1", r#"{"name":"Renamed"}"#, Some(("if-match", "*")))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Request::get("/v1/tournaments/t1").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["name"], "Renamed");

        let (status, body) = send(&app, Request::get("/v1/tournaments").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let list: DocumentList = serde_json::from_str(&body).unwrap();
        assert_eq!(list.documents.len(), 1);
        assert_eq!(list.documents[0].id, "t1");

        let (status, _) = send(&app, Request::delete("/v1/tournaments/t1").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Request::get("/v1/tournaments/t1").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, put("/v1/tournaments/t1", "{}", Some(("if-match", "*")))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_encoded_ids_round_trip() {
        let (_dir, app) = app();
        let (status, _) = send(&app, put("/v1/local_users/ana%40example.com", "{}", None)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, Request::get("/v1/local_users").body(Body::empty()).unwrap()).await;
        let list: DocumentList = serde_json::from_str(&body).unwrap();
        assert_eq!(list.documents[0].id, "ana@example.com");
    }

    #[tokio::test]
    async fn test_rejects_non_json_body() {
        let (_dir, app) = app();
        let (status, _) = send(&app, put("/v1/tournaments/t1", "not json", None)).await;
        assert!(status.is_client_error());
    }
}
