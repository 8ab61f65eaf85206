use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::error;

// 错误响应体很小，超过此长度的内容不记录
const MAX_LOGGED_BODY: usize = 4096;

/// 记录所有 5xx 响应的请求路径和响应体
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!("{} {} failed with {}, body unreadable: {}", method, uri, parts.status, e);
            parts.headers.remove(header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        "{} {} failed - Status: {}, Body: {}",
        method,
        uri,
        parts.status,
        String::from_utf8_lossy(&bytes)
    );

    // body 已被读取，需要重新构建
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn oversized_failure() -> impl IntoResponse {
        let body = "x".repeat(MAX_LOGGED_BODY + 1);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_LENGTH, body.len().to_string())],
            body,
        )
    }

    async fn small_failure() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom")
    }

    fn app() -> Router {
        Router::new()
            .route("/oversized", get(oversized_failure))
            .route("/small", get(small_failure))
            .layer(axum::middleware::from_fn(log_errors))
    }

    async fn call(path: &str) -> Response {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap()
    }

    // Content-Length 若存在必须与实际 body 长度一致
    async fn body_matching_length(response: Response) -> Vec<u8> {
        let declared = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .map(|v| v.to_str().unwrap().parse::<usize>().unwrap());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        if let Some(len) = declared {
            assert_eq!(len, bytes.len());
        }
        bytes.to_vec()
    }

    #[tokio::test]
    async fn test_unreadable_body_drops_content_length() {
        let response = call("/oversized").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_matching_length(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_small_body_is_kept() {
        let response = call("/small").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_matching_length(response).await, b"boom");
    }
}
