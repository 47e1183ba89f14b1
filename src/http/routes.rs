//! Request routing
//!
//! Turns a method and request target into a [`Route`]. GET paths are
//! percent-decoded once before matching, so `<rel>` segments arrive decoded.

use serde::Deserialize;

use crate::error::RequestError;

/// Represents an API endpoint matched from the request line.
///
/// Variants that address a file or directory carry the raw relative path;
/// resolving it against the storage root is the handler's job.
#[derive(Debug, PartialEq)]
pub enum Route {
    Index,
    List(String),
    Download(String),
    View(String),
    Upload,
    Mkdir,
    Delete,
    NotFound,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    path: String,
}

/// Parses a method and request target into a `Route`.
pub fn parse_route(method: &str, target: &str) -> Result<Route, RequestError> {
    let (raw_path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };

    match method {
        "GET" => {
            let path = urlencoding::decode(raw_path)
                .map_err(|_| RequestError::Malformed(format!("invalid encoding: {}", raw_path)))?;

            let route = match &*path {
                "/" | "/index.html" => Route::Index,
                "/api/list" => {
                    let query: ListQuery = serde_urlencoded::from_str(query)
                        .map_err(|e| RequestError::Malformed(format!("bad query: {}", e)))?;
                    Route::List(query.path)
                }
                other => {
                    if let Some(rel) = other.strip_prefix("/api/download/") {
                        Route::Download(rel.to_string())
                    } else if let Some(rel) = other.strip_prefix("/api/view/") {
                        Route::View(rel.to_string())
                    } else {
                        Route::NotFound
                    }
                }
            };
            Ok(route)
        }
        "POST" => Ok(match raw_path {
            "/api/upload" => Route::Upload,
            "/api/mkdir" => Route::Mkdir,
            "/api/delete" => Route::Delete,
            _ => Route::NotFound,
        }),
        _ => Ok(Route::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static_routes() {
        assert_eq!(parse_route("GET", "/").unwrap(), Route::Index);
        assert_eq!(parse_route("GET", "/index.html").unwrap(), Route::Index);
        assert_eq!(parse_route("POST", "/api/upload").unwrap(), Route::Upload);
        assert_eq!(parse_route("POST", "/api/mkdir").unwrap(), Route::Mkdir);
        assert_eq!(parse_route("POST", "/api/delete").unwrap(), Route::Delete);
    }

    #[test]
    fn test_parse_list_query() {
        assert_eq!(
            parse_route("GET", "/api/list?path=").unwrap(),
            Route::List(String::new())
        );
        assert_eq!(
            parse_route("GET", "/api/list").unwrap(),
            Route::List(String::new())
        );
        assert_eq!(
            parse_route("GET", "/api/list?path=docs%2Fmy+files&x=1").unwrap(),
            Route::List("docs/my files".to_string())
        );
    }

    #[test]
    fn test_parse_file_routes_decode_once() {
        assert_eq!(
            parse_route("GET", "/api/download/docs/a%20b.txt").unwrap(),
            Route::Download("docs/a b.txt".to_string())
        );
        assert_eq!(
            parse_route("GET", "/api/view/pics/%2525.png").unwrap(),
            Route::View("pics/%25.png".to_string())
        );
        assert_eq!(
            parse_route("GET", "/api/download/%2e%2e/%2e%2e/etc/passwd").unwrap(),
            Route::Download("../../etc/passwd".to_string())
        );
    }

    #[test]
    fn test_unknown_routes() {
        assert_eq!(parse_route("GET", "/api/download").unwrap(), Route::NotFound);
        assert_eq!(parse_route("GET", "/api/upload").unwrap(), Route::NotFound);
        assert_eq!(parse_route("POST", "/api/list").unwrap(), Route::NotFound);
        assert_eq!(parse_route("PUT", "/api/upload").unwrap(), Route::NotFound);
        assert_eq!(parse_route("DELETE", "/").unwrap(), Route::NotFound);
    }

    #[test]
    fn test_invalid_encoding_is_malformed() {
        assert!(matches!(
            parse_route("GET", "/api/view/%ff%fe"),
            Err(RequestError::Malformed(_))
        ));
    }
}
