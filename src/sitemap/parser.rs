//! Sitemap document parsing
//!
//! Turns the raw bytes of one sitemap (plain or gzipped) into a
//! [`SitemapNode`]. Parsing is all-or-nothing: a document that is not
//! well-formed yields a [`ParseError`] and no locations at all.

use crate::ParseError;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::Read;

/// Largest uncompressed sitemap accepted (the sitemaps.org limit)
pub const MAX_SITEMAP_BYTES: u64 = 50 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What a sitemap document turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<sitemapindex>`: locations are child sitemaps
    Index,
    /// `<urlset>`: locations are pages
    UrlSet,
    /// Any other root element; carries no locations
    Unknown,
}

impl SitemapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::UrlSet => "urlset",
            Self::Unknown => "unknown",
        }
    }

    /// The element wrapping each `<loc>` for this kind
    fn entry_element(&self) -> Option<&'static [u8]> {
        match self {
            Self::Index => Some(b"sitemap"),
            Self::UrlSet => Some(b"url"),
            Self::Unknown => None,
        }
    }
}

/// A parsed sitemap: its kind and the raw `<loc>` values in document order
///
/// Locations are trimmed and entity-unescaped but not yet resolved or
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapNode {
    pub url: String,
    pub kind: SitemapKind,
    pub locations: Vec<String>,
}

/// Parses one sitemap document
///
/// # Arguments
///
/// * `url` - Location the document was fetched from (used in errors)
/// * `body` - Raw response body; gzip is detected from its magic bytes
///
/// # Returns
///
/// * `Ok(SitemapNode)` - Well-formed document
/// * `Err(ParseError)` - Gzip failure, oversized body, invalid UTF-8 or malformed XML
///
/// # Example
///
/// ```
/// use product_scout::sitemap::{parse_sitemap, SitemapKind};
///
/// let xml = br#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://x.test/product/1</loc></url>
/// </urlset>"#;
/// let node = parse_sitemap("https://x.test/sitemap.xml", xml).unwrap();
/// assert_eq!(node.kind, SitemapKind::UrlSet);
/// assert_eq!(node.locations, vec!["https://x.test/product/1"]);
/// ```
pub fn parse_sitemap(url: &str, body: &[u8]) -> Result<SitemapNode, ParseError> {
    parse_sitemap_with_limit(url, body, MAX_SITEMAP_BYTES)
}

/// [`parse_sitemap`] with an explicit cap on the uncompressed size
fn parse_sitemap_with_limit(
    url: &str,
    body: &[u8],
    limit: u64,
) -> Result<SitemapNode, ParseError> {
    let decoded = decompress(url, body, limit)?;
    let bytes = decoded.strip_prefix(UTF8_BOM).unwrap_or(&decoded[..]);
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        url: url.to_string(),
    })?;

    let xml_error = |message: String| ParseError::Xml {
        url: url.to_string(),
        message,
    };

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    // Local names of the currently open elements
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut kind: Option<SitemapKind> = None;
    let mut locations = Vec::new();
    let mut current_loc: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if open.is_empty() {
                    if kind.is_some() {
                        return Err(xml_error("multiple root elements".to_string()));
                    }
                    kind = Some(root_kind(&name));
                }
                if name == b"loc" && in_entry(&open, kind) {
                    current_loc = Some(String::new());
                }
                open.push(name);
            }
            Ok(Event::Empty(e)) => {
                if open.is_empty() {
                    if kind.is_some() {
                        return Err(xml_error("multiple root elements".to_string()));
                    }
                    kind = Some(root_kind(e.local_name().as_ref()));
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    let text = e.unescape().map_err(|e| xml_error(e.to_string()))?;
                    loc.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if open.pop().is_some_and(|name| name == b"loc") {
                    if let Some(loc) = current_loc.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            locations.push(loc.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(xml_error(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !open.is_empty() {
        return Err(xml_error(format!(
            "unexpected end of document, {} element(s) still open",
            open.len()
        )));
    }

    let kind = kind.ok_or_else(|| xml_error("no root element".to_string()))?;

    Ok(SitemapNode {
        url: url.to_string(),
        kind,
        locations,
    })
}

/// Returns true if a location names a sitemap rather than a page
///
/// Some URL sets list nested sitemaps as ordinary `<url>` entries; those are
/// recognised by a path ending in `.xml` or `.xml.gz`.
pub fn is_sitemap_location(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    path.ends_with(".xml") || path.ends_with(".xml.gz")
}

fn root_kind(name: &[u8]) -> SitemapKind {
    match name {
        b"sitemapindex" => SitemapKind::Index,
        b"urlset" => SitemapKind::UrlSet,
        _ => SitemapKind::Unknown,
    }
}

/// True when the open elements are exactly `<root><entry>`
fn in_entry(open: &[Vec<u8>], kind: Option<SitemapKind>) -> bool {
    match kind.and_then(|k| k.entry_element()) {
        Some(entry) => open.len() == 2 && open[1] == entry,
        None => false,
    }
}

/// Gunzips `body` when it starts with the gzip magic bytes
///
/// Plain and decompressed bodies alike must fit in `limit` bytes.
fn decompress<'a>(url: &str, body: &'a [u8], limit: u64) -> Result<Cow<'a, [u8]>, ParseError> {
    let too_large = || ParseError::TooLarge {
        url: url.to_string(),
        limit,
    };

    if !body.starts_with(&GZIP_MAGIC) {
        if body.len() as u64 > limit {
            return Err(too_large());
        }
        return Ok(Cow::Borrowed(body));
    }

    let mut decoded = Vec::new();
    GzDecoder::new(body)
        .take(limit + 1)
        .read_to_end(&mut decoded)
        .map_err(|e| ParseError::Gzip {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if decoded.len() as u64 > limit {
        return Err(too_large());
    }

    Ok(Cow::Owned(decoded))
}
