use crate::{api, auth, telemetry};
use axum::extract::{DefaultBodyLimit, MatchedPath};
use axum::http::Request;
use axum::middleware;
use axum::Router;
use kochbuch_core::{IdentityProvider, Kitchen, UrlSigner};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Everything a handler can reach.
pub struct ServerState {
    pub kitchen: Kitchen,
    pub identity: Arc<dyn IdentityProvider>,
    /// Verifies the signed URLs handed out by the object storage.
    pub signer: UrlSigner,
}

/// Application state shared across all handlers
pub type AppState = Arc<ServerState>;

pub struct RouterOptions {
    pub max_upload_bytes: usize,
    pub track_query_count: bool,
}

pub fn build_router(state: AppState, options: RouterOptions) -> Router {
    // Public routes (no auth required). Recipe reads and sign-up/login live
    // in routers whose handlers opt in to authentication themselves.
    let public_router = api::public::router()
        .nest("/api/auth", api::auth::router())
        .nest("/api/recipes", api::recipes::router());

    // Protected routes (auth required)
    let protected_router = Router::new()
        .nest("/api/me", api::me::router())
        .nest("/api/favorites", api::favorites::router())
        .nest("/api/profile", api::profile::router())
        .nest("/api/photos", api::photos::router())
        .nest("/api/cart", api::cart::router())
        .nest("/api/test", api::testing::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(public_router)
        .merge(protected_router)
        .merge(swagger_ui)
        .with_state(state)
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            options.track_query_count,
            telemetry::query_count_header_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Don't create a span at all for noisy endpoints
                    if matched_path == "/api/test/unauthed-ping" {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(telemetry::query_counting_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use kochbuch_core::image::MAX_FILE_SIZE;
    use kochbuch_core::MemoryBackend;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        backend: MemoryBackend,
        router: Router,
        category_id: uuid::Uuid,
    }

    impl TestApp {
        fn new() -> Self {
            let backend = MemoryBackend::new();
            let category = backend.store.add_category("Suppen");
            let state = Arc::new(ServerState {
                kitchen: backend.kitchen(),
                identity: backend.identity.clone(),
                signer: backend.storage.signer().clone(),
            });
            let router = build_router(
                state,
                RouterOptions {
                    max_upload_bytes: MAX_FILE_SIZE,
                    track_query_count: false,
                },
            );
            Self {
                backend,
                router,
                category_id: category.id,
            }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn json(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.send(request).await;
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn sign_up(&self, email: &str, username: &str) -> String {
            let (status, body) = self
                .json(
                    Method::POST,
                    "/api/auth/signup",
                    None,
                    Some(json!({
                        "email": email,
                        "password": "hunter22",
                        "username": username,
                        "first_name": "Erika",
                        "last_name": "Mustermann"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["token"].as_str().unwrap().to_string()
        }

        fn soup(&self) -> Value {
            json!({
                "name": "Soup",
                "description": "Warm",
                "servings": 2,
                "instructions": "Boil",
                "image_url": null,
                "additional_info": null,
                "category_id": self.category_id,
                "ingredients": [
                    {"name": "Water", "quantity": 1.0, "unit": "l", "additional_info": null}
                ]
            })
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([40, 120, 200]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn multipart_request(uri: &str, token: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        let boundary = "kochbuch-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unauthed_ping() {
        let app = TestApp::new();
        let (status, body) = app
            .json(Method::GET, "/api/test/unauthed-ping", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "unauthed-ping");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = TestApp::new();
        for uri in ["/api/me", "/api/favorites", "/api/cart", "/api/profile"] {
            let (status, _) = app.json(Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
        let (status, _) = app
            .json(Method::GET, "/api/me", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_login_and_logout() {
        let app = TestApp::new();
        let token = app.sign_up("erika@example.com", "erika").await;

        let (status, me) = app.json(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "erika");

        let (status, _) = app
            .json(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": "ERIKA@example.com",
                    "password": "hunter22",
                    "username": "erika2",
                    "first_name": "E",
                    "last_name": "M"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "erika@example.com", "password": "wrong"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, login) = app
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "erika@example.com", "password": "hunter22"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let second = login["token"].as_str().unwrap().to_string();

        let (status, _) = app
            .json(Method::POST, "/api/auth/logout", Some(&second), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app
            .json(Method::GET, "/api/auth/session", Some(&second), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // The first session is untouched.
        let (status, _) = app
            .json(Method::GET, "/api/auth/session", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_recipe_lifecycle_and_ownership() {
        let app = TestApp::new();
        let owner = app.sign_up("owner@example.com", "owner").await;
        let other = app.sign_up("other@example.com", "other").await;

        let (status, _) = app
            .json(Method::POST, "/api/recipes", None, Some(app.soup()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) = app
            .json(Method::POST, "/api/recipes", Some(&owner), Some(app.soup()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        assert_eq!(created["ingredients"].as_array().unwrap().len(), 1);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = app
            .json(Method::GET, &format!("/api/recipes/{id}"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["category"], "Suppen");
        assert_eq!(fetched["creator"]["username"], "owner");

        let mut changed = app.soup();
        changed["name"] = json!("Better Soup");
        let (status, _) = app
            .json(
                Method::PUT,
                &format!("/api/recipes/{id}"),
                Some(&other),
                Some(changed.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = app
            .json(
                Method::PUT,
                &format!("/api/recipes/{id}"),
                Some(&owner),
                Some(changed),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Better Soup");

        let (status, mine) = app
            .json(Method::GET, "/api/me/recipes", Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(mine["recipes"].as_array().unwrap().is_empty());

        let (status, _) = app
            .json(Method::DELETE, &format!("/api/recipes/{id}"), Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app
            .json(Method::DELETE, &format!("/api/recipes/{id}"), Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app
            .json(Method::GET, &format!("/api/recipes/{id}"), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_recipe_is_rejected() {
        let app = TestApp::new();
        let token = app.sign_up("cook@example.com", "cook").await;
        let mut draft = app.soup();
        draft["name"] = json!("  ");
        let (status, body) = app
            .json(Method::POST, "/api/recipes", Some(&token), Some(draft))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_favorites_are_idempotent() {
        let app = TestApp::new();
        let token = app.sign_up("fan@example.com", "fan").await;
        let (_, created) = app
            .json(Method::POST, "/api/recipes", Some(&token), Some(app.soup()))
            .await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/favorites/{id}");

        for _ in 0..2 {
            let (status, body) = app.json(Method::PUT, &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["favorite"], true);
        }
        let recipe_id = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(app.backend.store.favorite_item_count(recipe_id), 1);

        let (_, list) = app
            .json(Method::GET, "/api/favorites", Some(&token), None)
            .await;
        assert_eq!(list["recipes"].as_array().unwrap().len(), 1);

        let (status, _) = app.json(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, check) = app.json(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(check["favorite"], false);
    }

    #[tokio::test]
    async fn test_uploaded_image_is_served_through_signed_url() {
        let app = TestApp::new();
        let token = app.sign_up("photo@example.com", "photo").await;
        let data = png_bytes();

        let response = app
            .send(multipart_request(
                "/api/photos/recipe",
                &token,
                "soup.png",
                &data,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let url = body["url"].as_str().unwrap();
        let local = url.strip_prefix("http://localhost:3000").unwrap();

        let response = app
            .send(Request::get(local).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let served = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(served.as_ref(), data.as_slice());

        let tampered = local.replace("token=", "token=00");
        let response = app
            .send(Request::get(tampered).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_profile_photo_updates_profile() {
        let app = TestApp::new();
        let token = app.sign_up("face@example.com", "face").await;
        let response = app
            .send(multipart_request(
                "/api/profile/photo",
                &token,
                "me.png",
                &png_bytes(),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let (_, profile) = app
            .json(Method::GET, "/api/profile", Some(&token), None)
            .await;
        assert!(profile["image_url"]
            .as_str()
            .unwrap()
            .contains("/storage/profiles-img/"));

        let (status, _) = app
            .json(
                Method::PATCH,
                "/api/profile",
                Some(&token),
                Some(json!({"username": "   "})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cart_flow() {
        let app = TestApp::new();
        let product = app
            .backend
            .store
            .add_product("Mehl", Some(1.5), None, Some("Backen"));
        let token = app.sign_up("shop@example.com", "shop").await;

        let (status, products) = app
            .json(Method::GET, "/api/products?q=meh", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(products["products"].as_array().unwrap().len(), 1);

        for _ in 0..2 {
            let (status, _) = app
                .json(
                    Method::POST,
                    "/api/cart/items",
                    Some(&token),
                    Some(json!({"product_id": product.id})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, cart) = app.json(Method::GET, "/api/cart", Some(&token), None).await;
        assert_eq!(cart["items"][0]["quantity"], 2);
        assert_eq!(cart["total"], 3.0);

        let item = cart["items"][0]["id"].as_str().unwrap().to_string();
        let (status, cart) = app
            .json(
                Method::DELETE,
                &format!("/api/cart/items/{item}"),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(cart["items"].as_array().unwrap().is_empty());
    }
}
