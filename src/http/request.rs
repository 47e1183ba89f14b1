//! Request body collection
//!
//! hyper frames the request (Content-Length or chunked); this module buffers
//! the body under the configured upload cap.

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;

use crate::error::RequestError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Collects a whole request body, refusing anything over `limit` bytes.
///
/// A declared `Content-Length` over the limit is refused before any of the
/// body is read, so a client waiting on `Expect: 100-continue` never gets the
/// go-ahead.
pub async fn read_body<B>(body: B, limit: u64) -> Result<Bytes, RequestError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    if body.size_hint().lower() > limit {
        return Err(RequestError::PayloadTooLarge { limit });
    }

    let cap = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, cap).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(RequestError::PayloadTooLarge { limit }),
        Err(e) => Err(RequestError::Truncated(e.to_string())),
    }
}
