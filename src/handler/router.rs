//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: serves the installer script at
//! `/`, authorizes everything else, and maps the remaining path onto a
//! storage key for GET, PUT and DELETE.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use super::auth;
use super::installer;
use crate::config::AppState;
use crate::error::{Error, Result};
use crate::http;
use crate::logger;
use crate::storage::PutOptions;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let response = route_request(req, &state).await;
    Ok(http::with_server_name(
        response,
        &state.config.http.server_name,
    ))
}

/// Storage key for a request path: the path without its leading slash
pub fn storage_key(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // The installer script is served for any method, without authorization
    if req.uri().path() == "/" {
        let script = installer::render_install_script(&state.config.mirror);
        return http::build_script_response(script);
    }

    let method = req.method().clone();
    let key = storage_key(req.uri().path()).to_string();

    match dispatch(req, &key, state).await {
        Ok(response) => response,
        Err(e) => error_response(&e, &method, &key),
    }
}

async fn dispatch<B>(req: Request<B>, key: &str, state: &AppState) -> Result<Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if !auth::authorize(req.method(), req.headers(), &state.config.auth) {
        return Err(Error::AuthorizationDenied);
    }

    match *req.method() {
        Method::GET => get_object(key, state).await,
        Method::PUT => put_object(req, key, state).await,
        Method::DELETE => delete_object(key, state).await,
        _ => Err(Error::MethodNotSupported(req.method().clone())),
    }
}

async fn get_object(key: &str, state: &AppState) -> Result<Response<Full<Bytes>>> {
    match state.store.get(key).await? {
        Some(blob) => Ok(http::build_blob_response(blob)),
        None => Err(Error::NotFound(key.to_string())),
    }
}

async fn put_object<B>(req: Request<B>, key: &str, state: &AppState) -> Result<Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = read_body(req.into_body(), state.config.http.max_body_size).await?;
    // No content type: the store records none and GET omits the header
    state.store.put(key, body, PutOptions::default()).await?;
    Ok(http::build_text_response(
        hyper::StatusCode::OK,
        format!("Put {key} successfully!"),
    ))
}

async fn delete_object(key: &str, state: &AppState) -> Result<Response<Full<Bytes>>> {
    state.store.delete(key).await?;
    Ok(http::build_text_response(hyper::StatusCode::OK, "Deleted!"))
}

/// Collect a request body, refusing anything over `limit` bytes
async fn read_body<B>(body: B, limit: u64) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, max).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(Error::PayloadTooLarge { limit })
        }
        Err(e) => Err(Error::Body(e.to_string())),
    }
}

/// Map a request error onto its plain-text response
fn error_response(err: &Error, method: &Method, key: &str) -> Response<Full<Bytes>> {
    match err {
        Error::AuthorizationDenied => http::build_403_response(),
        Error::NotFound(_) => http::build_404_response(),
        Error::MethodNotSupported(_) => http::build_405_response(),
        Error::PayloadTooLarge { limit } => {
            logger::log_warning(&format!(
                "{method} '{key}' rejected: body exceeds {limit} bytes"
            ));
            http::build_413_response()
        }
        Error::Body(reason) => {
            logger::log_warning(&format!("{method} '{key}' body error: {reason}"));
            http::build_text_response(err.status(), "Bad Request")
        }
        Error::StorageOperationFailed(e) => {
            logger::log_storage_error(method.as_str(), key, e);
            http::build_500_response()
        }
        Error::UpstreamFetchFailed { .. } | Error::ArchiveDecodeFailed(_) => {
            logger::log_error(&format!("Error processing request: {err}"));
            http::build_500_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::{Blob, BlobStore, MemoryStore, StorageError, StorageResult};
    use async_trait::async_trait;
    use hyper::header::{ALLOW, CONTENT_DISPOSITION, CONTENT_TYPE, ETAG, SERVER};
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "s3cret";

    /// Counts calls and forwards to an in-memory store
    #[derive(Default)]
    struct SpyStore {
        inner: MemoryStore,
        gets: AtomicUsize,
        puts: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for SpyStore {
        async fn get(&self, key: &str) -> StorageResult<Option<Blob>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> StorageResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, body, options).await
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    /// Every operation fails as if the backend were unreachable
    struct BrokenStore;

    #[async_trait]
    impl BlobStore for BrokenStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<Blob>> {
            Err(StorageError::Backend("connection refused".to_string()))
        }

        async fn put(&self, _key: &str, _body: Bytes, _options: PutOptions) -> StorageResult<()> {
            Err(StorageError::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
    }

    fn test_config(extra: &str) -> Config {
        Config::from_toml(&format!(
            r#"
            [mirror]
            user = "acme"
            repo = "dots"
            branch = "main"

            [auth]
            secret = "{SECRET}"

            {extra}
            "#
        ))
        .unwrap()
    }

    fn state_with(store: Arc<dyn BlobStore>) -> Arc<AppState> {
        Arc::new(AppState::new(test_config(""), store).unwrap())
    }

    fn request(method: Method, uri: &str, secret: Option<&str>, body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(secret) = secret {
            builder = builder.header("X-Custom-Auth-Key", secret);
        }
        builder
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let resp = handle_request(req, Arc::clone(state)).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("/a.txt"), "a.txt");
        assert_eq!(storage_key("/dir/b.png"), "dir/b.png");
        assert_eq!(storage_key("//double"), "/double");
    }

    #[tokio::test]
    async fn test_root_serves_installer_script() {
        let spy = Arc::new(SpyStore::default());
        let state = state_with(spy.clone());

        let (status, headers, body) = send(&state, request(Method::GET, "/", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/x-shellscript");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"install.sh\""
        );
        let script = String::from_utf8(body.to_vec()).unwrap();
        assert!(script.contains("git clone https://github.com/acme/dots.git -b main"));
        assert_eq!(spy.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_root_ignores_method_and_auth() {
        let state = state_with(Arc::new(MemoryStore::new()));
        for method in [Method::POST, Method::DELETE, Method::PATCH] {
            let (status, headers, _) = send(&state, request(method, "/", None, "")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers[CONTENT_TYPE], "text/x-shellscript");
        }
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let state = state_with(Arc::new(MemoryStore::new()));

        let (status, _, body) = send(
            &state,
            request(Method::PUT, "/notes/todo.txt", Some(SECRET), "buy milk"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Bytes::from("Put notes/todo.txt successfully!"));

        let (status, headers, body) = send(&state, request(Method::GET, "/notes/todo.txt", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Bytes::from("buy milk"));
        assert!(headers.contains_key(ETAG));
        // PUT through HTTP records no content type
        assert!(!headers.contains_key(CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_get_returns_stored_metadata() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "theme.rasi",
                Bytes::from("* {}"),
                PutOptions::with_content_type("text/rasi"),
            )
            .await
            .unwrap();
        let etag = store.get("theme.rasi").await.unwrap().unwrap().metadata.etag;
        let state = state_with(store);

        let (status, headers, _) = send(&state, request(Method::GET, "/theme.rasi", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/rasi");
        assert_eq!(headers[ETAG], etag.as_str());
        assert!(headers.contains_key(SERVER));
    }

    #[tokio::test]
    async fn test_get_missing_is_404() {
        let state = state_with(Arc::new(MemoryStore::new()));
        let (status, _, body) = send(&state, request(Method::GET, "/nope", None, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, Bytes::from("Object Not Found"));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_404() {
        let state = state_with(Arc::new(MemoryStore::new()));
        send(&state, request(Method::PUT, "/k", Some(SECRET), "v")).await;

        let (status, _, body) = send(&state, request(Method::DELETE, "/k", Some(SECRET), "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Bytes::from("Deleted!"));

        let (status, _, _) = send(&state, request(Method::GET, "/k", None, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let state = state_with(Arc::new(MemoryStore::new()));
        let (status, _, _) = send(&state, request(Method::DELETE, "/ghost", Some(SECRET), "")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unauthorized_put_never_touches_storage() {
        let spy = Arc::new(SpyStore::default());
        let state = state_with(spy.clone());

        let (status, _, body) = send(&state, request(Method::PUT, "/secret.txt", None, "x")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, Bytes::from("Forbidden"));

        let (status, _, _) = send(
            &state,
            request(Method::DELETE, "/secret.txt", Some("guess"), ""),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        assert_eq!(spy.puts.load(Ordering::SeqCst), 0);
        assert_eq!(spy.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_methods_are_forbidden_not_405() {
        let spy = Arc::new(SpyStore::default());
        let state = state_with(spy.clone());

        for method in [Method::POST, Method::PATCH, Method::HEAD] {
            let (status, headers, _) = send(&state, request(method, "/a.txt", Some(SECRET), "")).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert!(!headers.contains_key(ALLOW));
        }
        assert_eq!(spy.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_500() {
        let state = state_with(Arc::new(BrokenStore));

        let (status, _, body) = send(&state, request(Method::GET, "/a.txt", None, "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, Bytes::from("Internal Server Error"));

        let (status, _, body) = send(&state, request(Method::PUT, "/a.txt", Some(SECRET), "x")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!String::from_utf8_lossy(&body).contains("connection refused"));

        let (status, _, _) = send(&state, request(Method::DELETE, "/a.txt", Some(SECRET), "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_oversized_put_rejected() {
        let spy = Arc::new(SpyStore::default());
        let cfg = test_config("[http]\nmax_body_size = 4");
        let state = Arc::new(AppState::new(cfg, spy.clone()).unwrap());

        let (status, _, _) = send(&state, request(Method::PUT, "/big", Some(SECRET), "0123456789")).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(spy.puts.load(Ordering::SeqCst), 0);

        let (status, _, _) = send(&state, request(Method::PUT, "/small", Some(SECRET), "0123")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
