//! HTTP response building
//!
//! Small helpers for the response shapes the API uses. Every response carries
//! `Access-Control-Allow-Origin: *`; file bodies stream straight from disk.

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Full, StreamBody, combinators::BoxBody};
use hyper::body::Frame;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use log::warn;
use serde::Serialize;
use serde_json::json;
use std::io;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use crate::storage::FileHandle;

pub type ResponseBody = BoxBody<Bytes, io::Error>;

fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

fn build(
    status: StatusCode,
    content_type: HeaderValue,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(bytes) => build(
            status,
            HeaderValue::from_static("application/json"),
            full(bytes),
        ),
        Err(e) => {
            warn!("Failed to serialize response: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize response")
        }
    }
}

/// `{"success": true}`
pub fn success() -> Response<ResponseBody> {
    json(StatusCode::OK, &json!({ "success": true }))
}

/// `{"error": "<message>"}`
pub fn json_error(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let bytes = json!({ "error": message }).to_string();
    build(status, HeaderValue::from_static("application/json"), full(bytes))
}

pub fn text(status: StatusCode, message: &str) -> Response<ResponseBody> {
    build(
        status,
        HeaderValue::from_static("text/plain; charset=utf-8"),
        full(message.to_string()),
    )
}

pub fn html(document: &'static str) -> Response<ResponseBody> {
    build(
        StatusCode::OK,
        HeaderValue::from_static("text/html; charset=utf-8"),
        full(document),
    )
}

/// Streams an opened file in `buffer_size` chunks.
///
/// The body is capped at the length announced in `Content-Length`; a file that
/// shrinks mid-transfer makes hyper abort the connection rather than send a
/// short body.
pub fn file(
    handle: FileHandle,
    content_type: &str,
    buffer_size: usize,
) -> Response<ResponseBody> {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let reader = ReaderStream::with_capacity(handle.file.take(handle.len), buffer_size);
    let body = StreamBody::new(reader.map_ok(Frame::data)).boxed();

    let mut response = build(StatusCode::OK, content_type, body);
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(handle.len));
    response
}

/// Adds a download `Content-Disposition` for `name`.
pub fn with_attachment(
    mut response: Response<ResponseBody>,
    name: &str,
) -> Response<ResponseBody> {
    match HeaderValue::from_str(&attachment_disposition(name)) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => warn!("Skipping Content-Disposition for {:?}: {}", name, e),
    }
    response
}

/// `Content-Disposition` value for downloads.
///
/// The quoted `filename` is an ASCII-safe fallback; names that need it also
/// get an RFC 5987 `filename*`.
pub fn attachment_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if fallback == name {
        format!("attachment; filename=\"{}\"", name)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(name)
        )
    }
}
