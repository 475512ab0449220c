//! Folder page extraction.
//!
//! Everything that depends on the layout of the service's folder page lives
//! here: the script marker, the quoted-literal scan, the escape format of the
//! embedded listing, the positional child records and the title format. When
//! the page format drifts, this is the file to change.

use crate::error::ResolveError;
use crate::types::RemoteId;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Token that identifies the script carrying the folder listing
pub const PAYLOAD_MARKER: &str = "_DRIVE_ivd";

/// Separator between the folder name and the service suffix in the title
const TITLE_SEPARATOR: &str = " - ";

// Positions inside a child record
const RECORD_ID: usize = 0;
const RECORD_NAME: usize = 2;
const RECORD_TYPE: usize = 3;

#[allow(clippy::expect_used)]
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("valid script pattern")
});
#[allow(clippy::expect_used)]
static LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'((?:[^'\\]|\\.)*)'").expect("valid literal pattern"));
#[allow(clippy::expect_used)]
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid title pattern")
});

/// One child as listed on a folder page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildRecord {
    /// Remote id
    pub id: RemoteId,
    /// Decoded display name
    pub name: String,
    /// MIME type
    pub mime_type: String,
}

/// What a folder page tells us: its own name and its immediate children
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderPage {
    /// Folder display name taken from the title
    pub name: String,
    /// Children in listing order
    pub children: Vec<ChildRecord>,
}

/// Extract the folder name and child records from a folder page.
///
/// `url` is only used for error context.
///
/// # Errors
///
/// - [`ResolveError::DataNotFound`] when no script carries the marker or the
///   marker script has fewer than two quoted literals
/// - [`ResolveError::MalformedPayload`] when the literal does not decode to the
///   expected JSON shape
/// - [`ResolveError::TitleParse`] when the title has no `" - "` separator
pub fn parse_folder_page(url: &str, html: &str) -> Result<FolderPage, ResolveError> {
    let encoded = find_encoded_payload(html).ok_or_else(|| ResolveError::DataNotFound {
        url: url.to_string(),
    })?;

    let malformed = |reason: String| ResolveError::MalformedPayload {
        url: url.to_string(),
        reason,
    };

    let decoded = unescape_literal(encoded).map_err(malformed)?;
    let children = parse_child_records(&decoded).map_err(malformed)?;
    let name = folder_name_from_html(html)?;

    Ok(FolderPage { name, children })
}

/// Second single-quoted literal of the first script containing the marker
fn find_encoded_payload(html: &str) -> Option<&str> {
    let script = SCRIPT_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|body| body.contains(PAYLOAD_MARKER))?;

    // The first literal is the marker key itself.
    LITERAL_RE
        .captures_iter(script)
        .nth(1)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Undo the backslash escaping of a script string literal.
///
/// Bytes outside escapes map to the code point of the same value, so UTF-8
/// text comes out as one char per byte; [`decode_listed_name`] reverses that
/// for names.
pub(crate) fn unescape_literal(raw: &str) -> Result<String, String> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b != b'\\' {
            out.push(char::from(b));
            continue;
        }

        let Some(&esc) = bytes.get(i) else {
            return Err("literal ends with a lone backslash".to_string());
        };
        i += 1;

        match esc {
            b'\n' => {}
            b'\\' => out.push('\\'),
            b'\'' => out.push('\''),
            b'"' => out.push('"'),
            b'a' => out.push('\x07'),
            b'b' => out.push('\x08'),
            b'f' => out.push('\x0c'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'v' => out.push('\x0b'),
            b'0'..=b'7' => {
                let mut value = u32::from(esc - b'0');
                let mut digits = 1;
                while digits < 3
                    && let Some(&d @ b'0'..=b'7') = bytes.get(i)
                {
                    value = value * 8 + u32::from(d - b'0');
                    i += 1;
                    digits += 1;
                }
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            b'x' => {
                let value = read_hex(bytes, &mut i, 2)?;
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            b'u' => {
                let value = read_hex(bytes, &mut i, 4)?;
                out.push(combine_surrogates(value, bytes, &mut i)?);
            }
            b'U' => {
                let value = read_hex(bytes, &mut i, 8)?;
                let c = char::from_u32(value)
                    .ok_or_else(|| format!("\\U{:08x} is not a valid code point", value))?;
                out.push(c);
            }
            other => {
                // Unknown escapes stay as written (`\/` is left for the JSON parser).
                out.push('\\');
                out.push(char::from(other));
            }
        }
    }

    Ok(out)
}

fn read_hex(bytes: &[u8], i: &mut usize, len: usize) -> Result<u32, String> {
    let digits = bytes
        .get(*i..*i + len)
        .and_then(|d| std::str::from_utf8(d).ok())
        .ok_or_else(|| format!("truncated escape at byte {}", *i))?;
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| format!("invalid hex escape '{}' at byte {}", digits, *i))?;
    *i += len;
    Ok(value)
}

/// Resolve a `\uXXXX` value, pairing a high surrogate with a following `\uXXXX` low one
fn combine_surrogates(high: u32, bytes: &[u8], i: &mut usize) -> Result<char, String> {
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).ok_or_else(|| format!("unpaired surrogate \\u{:04x}", high));
    }
    if bytes.get(*i..*i + 2) != Some(b"\\u".as_slice()) {
        return Err(format!("unpaired surrogate \\u{:04x}", high));
    }
    let mut j = *i + 2;
    let low = read_hex(bytes, &mut j, 4)?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(format!("unpaired surrogate \\u{:04x}", high));
    }
    *i = j;
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or_else(|| format!("invalid surrogate pair at byte {}", *i))
}

/// Parse the decoded listing: `[ [record, ...] | null, ... ]`
fn parse_child_records(decoded: &str) -> Result<Vec<ChildRecord>, String> {
    let payload: Value =
        serde_json::from_str(decoded).map_err(|e| format!("payload is not JSON: {}", e))?;
    let top = payload
        .as_array()
        .ok_or_else(|| "payload is not a JSON array".to_string())?;

    let records = match top.first() {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(records)) => records,
        Some(other) => return Err(format!("child list has unexpected type: {}", other)),
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| -> Result<ChildRecord, String> {
            let field = |pos: usize| {
                record.get(pos).and_then(Value::as_str).ok_or_else(|| {
                    format!("child record {} has no string at position {}", index, pos)
                })
            };
            Ok(ChildRecord {
                id: RemoteId::new(field(RECORD_ID)?),
                name: decode_listed_name(field(RECORD_NAME)?),
                mime_type: field(RECORD_TYPE)?.to_string(),
            })
        })
        .collect()
}

/// Second decoding stage for names.
///
/// Code points below 256 become single bytes, higher ones become `\uXXXX`
/// text, and the resulting bytes are read as UTF-8. A name that is not valid
/// UTF-8 after this was already proper text and is kept as listed.
pub(crate) fn decode_listed_name(listed: &str) -> String {
    let mut bytes = Vec::with_capacity(listed.len());
    for c in listed.chars() {
        let cp = u32::from(c);
        if cp < 0x100 {
            bytes.push(cp as u8);
        } else if cp < 0x10000 {
            bytes.extend_from_slice(format!("\\u{:04x}", cp).as_bytes());
        } else {
            bytes.extend_from_slice(format!("\\U{:08x}", cp).as_bytes());
        }
    }
    String::from_utf8(bytes).unwrap_or_else(|_| listed.to_string())
}

/// Folder name from the page title: everything before the last `" - "`
pub(crate) fn folder_name_from_html(html: &str) -> Result<String, ResolveError> {
    let title = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()))
        .unwrap_or_default();

    let segments: Vec<&str> = title.split(TITLE_SEPARATOR).collect();
    if segments.len() < 2 {
        return Err(ResolveError::TitleParse { title });
    }
    Ok(segments[..segments.len() - 1].join(TITLE_SEPARATOR))
}

/// Decode the character references that show up in page titles
fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
