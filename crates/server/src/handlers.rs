//! Request dispatch for the static file server.

use crate::files::StaticFiles;
use crate::response::{self, HttpResponse};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, SERVER};
use http::{Method, Request, StatusCode, Uri};
use tracing::{debug, info};

/// Content type forced onto every `.js` request.
pub const JAVASCRIPT: &str = "application/javascript";

const SERVER_NAME: &str = concat!("static-https/", env!("CARGO_PKG_VERSION"));

/// Handle one request. The body is never read.
pub async fn handle<B>(req: Request<B>, files: &StaticFiles) -> HttpResponse {
    let (parts, _) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_string();

    let mut response = match method {
        Method::GET if path.ends_with(".js") => {
            serve_javascript(&parts.uri, &parts.headers, files).await
        }
        Method::GET => files.serve(&parts.uri, &parts.headers, false).await,
        Method::HEAD => files.serve(&parts.uri, &parts.headers, true).await,
        ref other => response::error(
            StatusCode::NOT_IMPLEMENTED,
            &format!("Unsupported method ('{other}')"),
            false,
        ),
    };

    info!("{} {} -> {}", method, path, response.status().as_u16());

    response
        .headers_mut()
        .insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}

/// Send the file's raw bytes as JavaScript, whatever they contain.
///
/// Anything that is not a readable regular file falls back to the generic
/// static routine, which answers 404, redirects or lists directories.
async fn serve_javascript(uri: &Uri, headers: &HeaderMap, files: &StaticFiles) -> HttpResponse {
    let path = files.translate_path(uri.path());
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);

    if is_file {
        match tokio::fs::read(&path).await {
            Ok(contents) => {
                let length = contents.len();
                let mut response = response::build(StatusCode::OK, contents);
                let headers = response.headers_mut();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JAVASCRIPT));
                headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
                return response;
            }
            Err(e) => debug!("failed to read {}: {}", path.display(), e),
        }
    }

    files.serve(uri, headers, false).await
}
