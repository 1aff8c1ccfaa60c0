//! Static file serving under a root directory.
//!
//! Mirrors what browsers expect from a stock development file server:
//! index files, directory listings, trailing-slash redirects and
//! `If-Modified-Since` revalidation.

use crate::response::{self, HttpResponse};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{
    CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED, LOCATION,
};
use http::{StatusCode, Uri};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Characters left unescaped in listing links.
const LINK_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Serves files below `root`.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL path onto the filesystem.
    ///
    /// Query and fragment are ignored, `.` and `..` are resolved lexically
    /// and can never climb above the root.
    pub fn translate_path(&self, request_path: &str) -> PathBuf {
        let path = request_path.split(['?', '#']).next().unwrap_or_default();
        let decoded = percent_decode_str(path).decode_utf8_lossy();

        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other if is_plain_name(other) => segments.push(other),
                _ => {}
            }
        }

        let mut resolved = self.root.clone();
        resolved.extend(segments);
        resolved
    }

    /// Serve a GET (or HEAD, when `head` is set) for `uri`.
    pub async fn serve(&self, uri: &Uri, headers: &HeaderMap, head: bool) -> HttpResponse {
        let mut path = self.translate_path(uri.path());

        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            return response::error(StatusCode::NOT_FOUND, "File not found", head);
        };

        if metadata.is_dir() {
            if !uri.path().ends_with('/') {
                return redirect_with_slash(uri);
            }
            match find_index(&path).await {
                Some(index) => path = index,
                None => return self.list_directory(&path, uri, head).await,
            }
        } else if uri.path().ends_with('/') {
            return response::error(StatusCode::NOT_FOUND, "File not found", head);
        }

        self.serve_file(&path, headers, head).await
    }

    /// Read a regular file, honouring `If-Modified-Since`.
    async fn serve_file(&self, path: &Path, headers: &HeaderMap, head: bool) -> HttpResponse {
        let Ok(metadata) = tokio::fs::metadata(path).await else {
            return response::error(StatusCode::NOT_FOUND, "File not found", head);
        };
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        if let Some(modified) = modified
            && not_modified_since(headers, modified)
        {
            debug!("{} not modified", path.display());
            return response::build(StatusCode::NOT_MODIFIED, Bytes::new());
        }

        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!("failed to read {}: {}", path.display(), e);
                return response::error(StatusCode::NOT_FOUND, "File not found", head);
            }
        };

        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        let length = contents.len();
        let mut response =
            response::build(StatusCode::OK, if head { Vec::new() } else { contents });
        response::set_header(&mut response, CONTENT_TYPE, content_type.as_ref());
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(length));
        if let Some(modified) = modified {
            response::set_header(
                &mut response,
                LAST_MODIFIED,
                &modified.format(HTTP_DATE).to_string(),
            );
        }
        response
    }

    /// Render an HTML index of `dir`.
    async fn list_directory(&self, dir: &Path, uri: &Uri, head: bool) -> HttpResponse {
        let Ok(entries) = read_entries(dir).await else {
            return response::error(StatusCode::NOT_FOUND, "No permission to list directory", head);
        };

        let display_path = percent_decode_str(uri.path()).decode_utf8_lossy();
        let title = format!(
            "Directory listing for {}",
            response::html_escape(&display_path)
        );

        let mut page = String::new();
        let _ = write!(
            page,
            "<!DOCTYPE HTML>\n\
             <html lang=\"en\">\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>{title}</title>\n\
             </head>\n\
             <body>\n\
             <h1>{title}</h1>\n\
             <hr>\n\
             <ul>\n"
        );
        for entry in &entries {
            let _ = writeln!(
                page,
                "<li><a href=\"{}\">{}</a></li>",
                utf8_percent_encode(&entry.link, LINK_SAFE),
                response::html_escape(&entry.display)
            );
        }
        page.push_str("</ul>\n<hr>\n</body>\n</html>\n");

        let length = page.len();
        let mut response =
            response::build(StatusCode::OK, if head { String::new() } else { page });
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        response
    }
}

/// One line of a directory listing.
#[derive(Debug, PartialEq, Eq)]
struct ListingEntry {
    link: String,
    display: String,
}

/// Directory entries sorted case-insensitively; directories get a trailing
/// slash and symlinks an `@` marker.
async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry
            .file_type()
            .await
            .map(|t| t.is_symlink())
            .unwrap_or(false);
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        names.push((name, is_dir, is_symlink));
    }
    names.sort_by_key(|(name, _, _)| name.to_lowercase());

    Ok(names
        .into_iter()
        .map(|(name, is_dir, is_symlink)| {
            let link = if is_dir { format!("{name}/") } else { name.clone() };
            let display = if is_symlink {
                format!("{name}@")
            } else {
                link.clone()
            };
            ListingEntry { link, display }
        })
        .collect())
}

async fn find_index(dir: &Path) -> Option<PathBuf> {
    for name in INDEX_FILES {
        let candidate = dir.join(name);
        if let Ok(metadata) = tokio::fs::metadata(&candidate).await
            && metadata.is_file()
        {
            return Some(candidate);
        }
    }
    None
}

fn redirect_with_slash(uri: &Uri) -> HttpResponse {
    let location = match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    };
    let mut response = response::build(StatusCode::MOVED_PERMANENTLY, Bytes::new());
    response::set_header(&mut response, LOCATION, &location);
    response
        .headers_mut()
        .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

/// True when the client's cached copy is still current.
fn not_modified_since(headers: &HeaderMap, modified: DateTime<Utc>) -> bool {
    if headers.contains_key(IF_NONE_MATCH) {
        return false;
    }
    let Some(since) = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
    else {
        return false;
    };
    modified.timestamp() <= since.timestamp()
}

/// A single normal path component: no separators, prefixes or NULs.
fn is_plain_name(segment: &str) -> bool {
    if segment.contains('\0') {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
