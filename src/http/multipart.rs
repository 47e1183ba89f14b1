//! `multipart/form-data` parsing
//!
//! Works on a fully buffered request body. The body is split on
//! `--<boundary>`; within each part everything before the first CRLFCRLF is
//! headers and everything after it, minus one trailing CRLF, is the value.
//! File payloads borrow from the body instead of being copied.

use std::collections::HashMap;

use crate::error::MultipartError;

const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

/// A part that carried a `filename` attribute
#[derive(Debug, PartialEq)]
pub struct FilePart<'a> {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: &'a [u8],
}

/// Parsed form: plain text fields and file parts, keyed by field name.
///
/// When a name repeats, the later part wins.
#[derive(Debug, Default)]
pub struct MultipartForm<'a> {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart<'a>>,
}

impl<'a> MultipartForm<'a> {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&FilePart<'a>> {
        self.files.get(name)
    }
}

/// Extracts the boundary token from a `Content-Type` header value.
pub fn extract_boundary(content_type: &str) -> Result<&str, MultipartError> {
    let lowered = content_type.to_ascii_lowercase();

    if !lowered.contains("multipart/form-data") {
        return Err(MultipartError::NotMultipart(content_type.to_string()));
    }

    // ASCII lowercasing keeps byte offsets, so indices carry over
    let start = lowered
        .find("boundary=")
        .ok_or(MultipartError::MissingBoundary)?
        + "boundary=".len();

    let rest = &content_type[start..];
    let end = rest.find(';').unwrap_or(rest.len());
    let boundary = rest[..end].trim().trim_matches('"');

    if boundary.is_empty() {
        return Err(MultipartError::MissingBoundary);
    }

    Ok(boundary)
}

/// Parses a multipart body given the request's `Content-Type` header value.
pub fn parse<'a>(
    content_type: &str,
    body: &'a [u8],
) -> Result<MultipartForm<'a>, MultipartError> {
    let boundary = extract_boundary(content_type)?;
    parse_with_boundary(body, boundary)
}

/// Parses a multipart body split on `--<boundary>`.
pub fn parse_with_boundary<'a>(
    body: &'a [u8],
    boundary: &str,
) -> Result<MultipartForm<'a>, MultipartError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let pieces = split_on(body, &delimiter);

    // The closing delimiter is `--<boundary>--`, i.e. a piece starting with `--`
    let closing = pieces
        .iter()
        .skip(1)
        .position(|piece| piece.starts_with(b"--"))
        .ok_or(MultipartError::Truncated)?
        + 1;

    let mut form = MultipartForm::default();

    // pieces[0] is the preamble; the closing piece and anything after it is epilogue
    for part in &pieces[1..closing] {
        let Some(header_end) = find(part, HEADER_SEPARATOR) else {
            continue;
        };

        let headers = String::from_utf8_lossy(&part[..header_end]);
        let Some(disposition) = header_value(&headers, "content-disposition") else {
            continue;
        };
        let Some(name) = disposition_param(disposition, "name") else {
            continue;
        };

        let mut value = &part[header_end + HEADER_SEPARATOR.len()..];
        if value.ends_with(CRLF) {
            value = &value[..value.len() - CRLF.len()];
        }

        match disposition_param(disposition, "filename") {
            Some(filename) => {
                let content_type = header_value(&headers, "content-type").map(str::to_string);
                form.files.insert(
                    name.to_string(),
                    FilePart {
                        filename: filename.to_string(),
                        content_type,
                        data: value,
                    },
                );
            }
            None => {
                let text = std::str::from_utf8(value)
                    .map_err(|_| MultipartError::InvalidField(name.to_string()))?;
                form.fields.insert(name.to_string(), text.to_string());
            }
        }
    }

    Ok(form)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_on<'a>(mut haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    while let Some(index) = find(haystack, delimiter) {
        pieces.push(&haystack[..index]);
        haystack = &haystack[index + delimiter.len()..];
    }
    pieces.push(haystack);
    pieces
}

fn header_value<'h>(headers: &'h str, name: &str) -> Option<&'h str> {
    headers.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

/// Looks up a `key=value` parameter of a Content-Disposition value.
///
/// Quoted values are returned verbatim between the quotes; semicolons inside
/// quotes don't split parameters.
fn disposition_param<'h>(disposition: &'h str, key: &str) -> Option<&'h str> {
    split_params(disposition).into_iter().find_map(|param| {
        let (k, v) = param.split_once('=')?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let v = v.trim();
        match v.strip_prefix('"') {
            Some(quoted) => Some(quoted.split('"').next().unwrap_or(quoted)),
            None => Some(v),
        }
    })
}

fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(value[start..].trim());
    params
}
