//! Request handlers
//!
//! One function per route. Each returns `Result<Response, DriveError>`;
//! [`handle_request`] turns errors into JSON or plain-text responses, so a
//! failing request never takes down its connection.

use bytes::Bytes;
use hyper::body::Body;
use hyper::header::{CONTENT_TYPE, HeaderMap};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{
    DriveError, MultipartError, RequestError, StorageError, api_error_status, error_to_status,
    handle_error,
};
use crate::http::multipart;
use crate::http::request::read_body;
use crate::http::response::{self, ResponseBody};
use crate::http::routes::{Route, parse_route};
use crate::server::AppContext;
use crate::storage::{self, Entry};

const INDEX_HTML: &str = include_str!("../../static/index.html");

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct MkdirRequest {
    #[serde(default)]
    path: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    #[serde(default)]
    path: String,
}

/// How errors are rendered for a route
#[derive(Debug, Clone, Copy)]
enum ErrorFormat {
    Json,
    Text,
}

/// Dispatches a request to its handler.
///
/// Bodies are only read for the POST routes, under the configured upload cap.
pub async fn handle_request<B>(request: Request<B>, ctx: &AppContext) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = request.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let route = match parse_route(parts.method.as_str(), target) {
        Ok(route) => route,
        Err(e) => return error_response(e.into(), ErrorFormat::Json),
    };

    match route {
        Route::Index => response::html(INDEX_HTML),
        Route::List(path) => respond(list_files(ctx, &path).await, ErrorFormat::Json),
        Route::Download(path) => respond(serve_file(ctx, &path, true).await, ErrorFormat::Text),
        Route::View(path) => respond(serve_file(ctx, &path, false).await, ErrorFormat::Text),
        Route::Upload | Route::Mkdir | Route::Delete => {
            let bytes = match read_body(body, ctx.config.max_body_bytes()).await {
                Ok(bytes) => bytes,
                Err(e) => return error_response(e.into(), ErrorFormat::Json),
            };
            let result = match route {
                Route::Upload => upload_file(ctx, &parts.headers, &bytes).await,
                Route::Mkdir => create_folder(ctx, &bytes).await,
                _ => delete_item(ctx, &bytes).await,
            };
            respond(result, ErrorFormat::Json)
        }
        Route::NotFound => response::text(StatusCode::NOT_FOUND, "404 Not Found"),
    }
}

async fn list_files(ctx: &AppContext, path: &str) -> Result<Response<ResponseBody>, DriveError> {
    let dir = ctx.root.resolve(path)?;
    let items = storage::list(&ctx.root, &dir).await?;
    Ok(response::json(StatusCode::OK, &ListResponse { items }))
}

/// Streams a file; `attachment` adds a download `Content-Disposition`.
async fn serve_file(
    ctx: &AppContext,
    path: &str,
    attachment: bool,
) -> Result<Response<ResponseBody>, DriveError> {
    let resolved = ctx.root.resolve(path)?;
    let handle = storage::open_for_read(&ctx.root, &resolved).await?;

    let mime = mime_guess::from_path(&handle.name).first_or_octet_stream();
    let name = handle.name.clone();
    let served = response::file(handle, mime.essence_str(), ctx.config.buffer_size);

    if attachment {
        Ok(response::with_attachment(served, &name))
    } else {
        Ok(served)
    }
}

async fn upload_file(
    ctx: &AppContext,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response<ResponseBody>, DriveError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let form = multipart::parse(content_type, body)?;

    let file = form
        .file("file")
        .filter(|file| !file.filename.is_empty())
        .ok_or(MultipartError::MissingFile)?;

    let dir = ctx.root.resolve(form.field("path").unwrap_or_default())?;
    storage::write_file(&dir, &file.filename, file.data).await?;

    Ok(response::success())
}

async fn create_folder(
    ctx: &AppContext,
    body: &Bytes,
) -> Result<Response<ResponseBody>, DriveError> {
    let body: MkdirRequest = parse_json(body)?;

    if body.name.trim().is_empty() {
        return Err(StorageError::InvalidName("Folder name required".into()).into());
    }

    // The parent and the new name are resolved together so `name` can't step outside
    let target = ctx.root.resolve(&format!("{}/{}", body.path, body.name))?;
    storage::make_directory(&target).await?;

    Ok(response::success())
}

async fn delete_item(
    ctx: &AppContext,
    body: &Bytes,
) -> Result<Response<ResponseBody>, DriveError> {
    let body: DeleteRequest = parse_json(body)?;

    let target = ctx.root.resolve_entry(&body.path)?;
    storage::delete(&ctx.root, &target).await?;

    Ok(response::success())
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, RequestError> {
    serde_json::from_slice(body).map_err(|e| RequestError::InvalidJson(e.to_string()))
}

fn respond(
    result: Result<Response<ResponseBody>, DriveError>,
    format: ErrorFormat,
) -> Response<ResponseBody> {
    result.unwrap_or_else(|e| error_response(e, format))
}

fn error_response(err: DriveError, format: ErrorFormat) -> Response<ResponseBody> {
    let status = match format {
        ErrorFormat::Json => api_error_status(&err),
        ErrorFormat::Text => error_to_status(&err),
    };
    handle_error(&err, status);

    match format {
        ErrorFormat::Json => response::json_error(status, &err.to_string()),
        ErrorFormat::Text => response::text(status, &err.to_string()),
    }
}
