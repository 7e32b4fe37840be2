use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{admin, auth, rides, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api",
              Router::new()
                  .merge(auth::router())
                  .merge(rides::router())
                  .merge(admin::router())
                  .merge(users::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let path = req.uri().path().to_owned();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        %path,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FAKE_ADMIN_PASSWORD;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn ann() -> Value {
        json!({
            "name": "Ann",
            "email": "ann@x.com",
            "password": "secret1",
            "phoneNumber": "+1555",
            "employeeId": "E1"
        })
    }

    async fn admin_token(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({ "email": "admin@ridebook.test", "password": FAKE_ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["id"], "admin-id");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn rider_lifecycle() {
        let app = build_app(AppState::fake());

        let (status, body) = call(&app, Method::POST, "/api/auth/register", None, Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["user"]["email"], "ann@x.com");
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["user"].get("password").is_none());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@x.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/rides",
            Some(&token),
            Some(json!({ "pickup": "A", "dropoff": "B" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Ride requested successfully");
        assert_eq!(body["ride"]["status"], "requested");
        let ride_id = body["ride"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::GET, "/api/rides", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rides"].as_array().unwrap().len(), 1);
        assert_eq!(body["rides"][0]["id"], ride_id.as_str());

        let cancel = format!("/api/rides/{ride_id}/cancel");
        let (status, body) = call(&app, Method::PATCH, &cancel, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ride"]["status"], "cancelled");

        let (status, _) = call(&app, Method::PATCH, &cancel, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, &format!("/api/rides/{ride_id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ride"]["status"], "cancelled");
    }

    #[tokio::test]
    async fn admin_reviews_and_completes_a_ride() {
        let app = build_app(AppState::fake());

        let (_, body) = call(&app, Method::POST, "/api/auth/register", None, Some(ann())).await;
        let rider = body["token"].as_str().unwrap().to_string();
        let (_, body) = call(
            &app,
            Method::POST,
            "/api/rides",
            Some(&rider),
            Some(json!({ "pickup": "A", "dropoff": "B" })),
        )
        .await;
        let ride_id = body["ride"]["id"].as_str().unwrap().to_string();

        let admin = admin_token(&app).await;

        let (status, body) = call(&app, Method::GET, "/api/admin/all-rides", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        assert_eq!(body["rides"][0]["owner"]["name"], "Ann");
        assert_eq!(body["rides"][0]["owner"]["email"], "ann@x.com");

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/admin/ride/{ride_id}/status"),
            Some(&admin),
            Some(json!({ "status": "completed", "fare": 18.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Ride status updated successfully");
        assert_eq!(body["ride"]["status"], "completed");
        assert_eq!(body["ride"]["approvedBy"], "admin-id");

        let (status, body) = call(&app, Method::GET, "/api/admin/analytics", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analytics"]["totalRides"], 1);
        assert_eq!(body["analytics"]["completedRides"], 1);
        assert_eq!(body["analytics"]["totalRevenue"], 18.5);

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/admin/filter?status=completed&minFare=10",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/admin/filter?status=teleported",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/api/rides/{ride_id}/cancel"),
            Some(&rider),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rider_token_is_forbidden_on_admin_routes() {
        let app = build_app(AppState::fake());
        let (_, body) = call(&app, Method::POST, "/api/auth/register", None, Some(ann())).await;
        let rider = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::GET, "/api/admin/all-rides", Some(&rider), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, Method::GET, "/api/admin/all-rides", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_update_and_account_deletion() {
        let app = build_app(AppState::fake());
        let (_, body) = call(&app, Method::POST, "/api/auth/register", None, Some(ann())).await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/user/profile",
            Some(&token),
            Some(json!({ "name": "Ann B", "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ann B");
        assert_eq!(body["role"], "user");

        let (status, body) = call(&app, Method::DELETE, "/api/user/delete", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Account deleted successfully.");

        let (status, _) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_json_is_a_json_error() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Invalid request body");
    }
}
