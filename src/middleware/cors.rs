//! Origin gate + credentialed CORS for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native apps and server-to-server calls send no
//!   `Origin` header and pass straight through.
//! - Apply at the Router level, after routes are registered, so nothing below
//!   the gate runs for a rejected origin.
//!
//! Policy:
//! - Origin present and not in the allow-list: 403 before any route handler.
//! - Origin allowed: the response echoes that exact origin (never `*`) and
//!   advertises `Access-Control-Allow-Credentials: true`.
//! - Preflights from allowed origins are answered here, never by a handler.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Method, Request, header, request::Parts};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::error::AppError;
use crate::services::origin_gate::{AllowList, CREDENTIALS_SUPPORTED, Decision, evaluate};

/// Apply the origin gate and CORS headers to the given Router.
///
/// Layer order matters: the gate is added last so it is the outermost of the
/// two and sees every request (preflights included) first.
pub fn apply(router: Router, allow_list: Arc<AllowList>) -> Router {
    router
        .layer(cors_layer(Arc::clone(&allow_list)))
        .layer(middleware::from_fn_with_state(allow_list, origin_gate))
}

fn cors_layer(allow_list: Arc<AllowList>) -> CorsLayer {
    // Echo only origins the gate lets through.
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req: &Parts| {
        origin
            .to_str()
            .map(|o| evaluate(Some(o), &allow_list).is_allow())
            .unwrap_or(false)
    });

    // With credentials enabled, wildcards are not allowed for any of these.
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(CREDENTIALS_SUPPORTED)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(60 * 10))
}

async fn origin_gate(
    State(allow_list): State<Arc<AllowList>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    {
        // A non-UTF-8 Origin is still a present origin; "" never matches.
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .map(|v| v.to_str().unwrap_or_default());

        let decision = evaluate(origin, &allow_list);
        match decision {
            Decision::Allow { credentialed } => {
                tracing::debug!(origin = origin.unwrap_or("-"), credentialed, "origin allowed");
            }
            Decision::Deny { reason } => {
                tracing::warn!(
                    origin = origin.unwrap_or_default(),
                    method = %req.method(),
                    path = req.uri().path(),
                    %reason,
                    "cross-origin request rejected"
                );
            }
        }

        decision.into_result(origin)?;
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const LOCAL: &str = "http://localhost:3000";

    fn probe_router(allow_list: AllowList, hits: Arc<AtomicUsize>) -> Router {
        let router = Router::new().route(
            "/probe",
            get(move || {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    "reached"
                }
            })
            .post(|| async { "posted" }),
        );
        apply(router, Arc::new(allow_list))
    }

    fn get_probe(origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/probe");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/probe")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-request-id")
            .body(Body::empty())
            .unwrap()
    }

    fn header_str<'a>(res: &'a Response, name: header::HeaderName) -> Option<&'a str> {
        res.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn allowed_origin_is_echoed_with_credentials() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::from_config(None), Arc::clone(&hits));

        let res = app.oneshot(get_probe(Some(LOCAL))).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            header_str(&res, header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(LOCAL)
        );
        assert_eq!(
            header_str(&res, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some("true")
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disallowed_origin_never_reaches_the_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::from_config(None), Arc::clone(&hits));

        let res = app
            .oneshot(get_probe(Some("http://evil.example")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "ORIGIN_NOT_PERMITTED");
    }

    #[tokio::test]
    async fn request_without_origin_passes_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::default(), Arc::clone(&hits));

        let res = app.oneshot(get_probe(None)).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn origin_case_must_match_exactly() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(
            AllowList::new(["https://example.com"]),
            Arc::clone(&hits),
        );

        let res = app
            .oneshot(get_probe(Some("https://Example.com")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_allow_list_denies_any_present_origin() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::from_config(Some(",")), Arc::clone(&hits));

        let res = app.oneshot(get_probe(Some(LOCAL))).await.unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_utf8_origin_is_denied() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::from_config(None), Arc::clone(&hits));

        let mut req = get_probe(None);
        req.headers_mut().insert(
            header::ORIGIN,
            HeaderValue::from_bytes(b"http://\xfflocalhost:3000").unwrap(),
        );
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_is_answered() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::from_config(None), Arc::clone(&hits));

        let res = app.oneshot(preflight(LOCAL)).await.unwrap();

        assert!(res.status().is_success());
        assert_eq!(
            header_str(&res, header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(LOCAL)
        );
        assert_eq!(
            header_str(&res, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some("true")
        );
        let methods = header_str(&res, header::ACCESS_CONTROL_ALLOW_METHODS).unwrap_or_default();
        assert!(methods.contains("POST"));
        assert!(methods.contains("PATCH"));
        assert_eq!(
            header_str(&res, header::ACCESS_CONTROL_ALLOW_HEADERS),
            Some("content-type,x-request-id")
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preflight_from_denied_origin_is_rejected() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(AllowList::from_config(None), hits);

        let res = app.oneshot(preflight("http://evil.example")).await.unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn gate_is_shared_across_concurrent_requests() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = probe_router(
            AllowList::new(["https://a.example", "https://b.example"]),
            Arc::clone(&hits),
        );

        let mut handles = Vec::new();
        for i in 0..32 {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                let origin = match i % 3 {
                    0 => "https://a.example",
                    1 => "https://b.example",
                    _ => "https://c.example",
                };
                let res = app.oneshot(get_probe(Some(origin))).await.unwrap();
                (origin, res.status())
            }));
        }

        for handle in handles {
            let (origin, status) = handle.await.expect("task panic");
            if origin == "https://c.example" {
                assert_eq!(status, StatusCode::FORBIDDEN);
            } else {
                assert_eq!(status, StatusCode::OK);
            }
        }
        // 0..32: i % 3 == 2 for 10 values
        assert_eq!(hits.load(Ordering::SeqCst), 22);
    }
}
