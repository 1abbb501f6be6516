use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::warn;

const ACCEPTED_FORM_TYPES: [&str; 2] = ["multipart/form-data", "application/x-www-form-urlencoded"];

/// Request validation middleware
pub async fn request_validation_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    validate_content_type(&request)?;

    Ok(next.run(request).await)
}

/// POST bodies must be HTML form submissions
fn validate_content_type(request: &Request<Body>) -> Result<(), (StatusCode, Json<Value>)> {
    if request.method() != Method::POST {
        return Ok(());
    }

    let Some(content_type) = request.headers().get(header::CONTENT_TYPE) else {
        warn!("Missing content type header");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Missing content type",
                "message": "Content-Type header is required for requests with body",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ));
    };

    let content_type_str = content_type.to_str().unwrap_or("");
    let media_type = content_type_str
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if !ACCEPTED_FORM_TYPES.contains(&media_type.as_str()) {
        warn!("Invalid content type: {}", content_type_str);
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({
                "error": "Unsupported media type",
                "message": "Content-Type must be multipart/form-data or application/x-www-form-urlencoded",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ));
    }

    Ok(())
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; img-src 'self' https: data:"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        middleware,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/cadastro", post(ok_handler))
            .route("/cardapio", get(ok_handler))
            .layer(middleware::from_fn(request_validation_middleware))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    fn post_with(content_type: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/cadastro");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_accepts_form_content_types() {
        for content_type in [
            "multipart/form-data; boundary=xyz",
            "application/x-www-form-urlencoded",
            "Application/X-WWW-Form-Urlencoded; charset=UTF-8",
        ] {
            let response = app().oneshot(post_with(Some(content_type))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", content_type);
        }
    }

    #[tokio::test]
    async fn test_rejects_json_post() {
        let response = app()
            .oneshot(post_with(Some("application/json")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_rejects_post_without_content_type() {
        let response = app().oneshot(post_with(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_is_not_checked_and_gets_security_headers() {
        let request = Request::builder()
            .uri("/cardapio")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(response.headers().contains_key("content-security-policy"));
    }
}
