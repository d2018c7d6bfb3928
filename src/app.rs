use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{admin, ai, auth, listings, reset, state::AppState, users, wishlist};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(reset::router())
                .merge(users::router())
                .merge(wishlist::router())
                .merge(listings::router(state.clone()))
                .merge(admin::router())
                .merge(ai::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
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

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::JwtKeys,
        testing::{fake_state, seed_user},
        users::repo_types::ApprovalStatus,
    };
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    const LISTING_BODY: &str = r#"{
        "title": "Lake view flat",
        "price": 25000,
        "addressLine1": "Road 5",
        "cityTown": "Dhaka",
        "upazila": "Gulshan",
        "district": "Dhaka",
        "postalCode": "1212",
        "propertyType": "apartment",
        "listingType": "rent"
    }"#;

    fn create_request(token: Option<&str>) -> Request<Body> {
        let mut b = Request::post("/api/v1/properties").header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        b.body(Body::from(LISTING_BODY)).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (state, _) = fake_state();
        let res = build_app(state)
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn listing_creation_runs_auth_then_profile_then_gate() {
        let (state, _) = fake_state();
        let keys = JwtKeys::from_ref(&state);
        let pending = seed_user(&state, "pending@example.com", ApprovalStatus::Pending).await;
        let approved = seed_user(&state, "approved@example.com", ApprovalStatus::Approved).await;
        let app = build_app(state.clone());

        let res = app.clone().oneshot(create_request(None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let token = keys.sign_access(pending.id).unwrap();
        let res = app.clone().oneshot(create_request(Some(&token))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let token = keys.sign_access(approved.id).unwrap();
        let res = app.clone().oneshot(create_request(Some(&token))).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app
            .oneshot(Request::get("/api/v1/properties").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_routes_refuse_regular_users() {
        let (state, _) = fake_state();
        let user = seed_user(&state, "plain@example.com", ApprovalStatus::Approved).await;
        let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();
        let res = build_app(state)
            .oneshot(
                Request::get("/api/v1/admin/stats")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
