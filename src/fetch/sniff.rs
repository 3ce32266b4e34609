//! Content-type sniffing for blobs whose source did not report one.
//!
//! Looks at the first 512 bytes only, matching magic numbers for the common
//! image formats plus a few document and archive types.

const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Exact prefix signatures, checked in order.
const MAGIC: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"%PDF-", "application/pdf"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
];

/// Markup tags matched case-insensitively after leading whitespace; the tag
/// must be followed by a space or `>`.
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<BODY",
    b"<SCRIPT",
    b"<TITLE",
    b"<DIV",
    b"<P",
    b"<!--",
];

/// Returns the best-guess MIME type for `data`.
///
/// Falls back to `text/plain` when the sample has no binary control bytes,
/// otherwise `application/octet-stream`. Never fails.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let sample = &data[..data.len().min(SNIFF_LEN)];

    if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| sample.starts_with(magic)) {
        return *mime;
    }
    if is_riff_webp(sample) {
        return "image/webp";
    }
    if let Some(brand) = iso_bmff_brand(sample) {
        match brand {
            b"avif" | b"avis" => return "image/avif",
            b"heic" | b"heix" => return "image/heic",
            b"mp41" | b"mp42" | b"isom" => return "video/mp4",
            _ => {}
        }
    }

    let markup = trim_leading_whitespace(sample);
    if starts_with_ignore_case(markup, b"<?xml") {
        return "text/xml; charset=utf-8";
    }
    if starts_with_ignore_case(markup, b"<svg") {
        return "image/svg+xml";
    }
    if HTML_TAGS.iter().any(|tag| matches_html_tag(markup, tag)) {
        return TEXT_HTML;
    }

    if sample.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

fn is_riff_webp(sample: &[u8]) -> bool {
    sample.len() >= 14 && &sample[..4] == b"RIFF" && &sample[8..14] == b"WEBPVP"
}

/// Major brand of an ISO base media file (`....ftypXXXX`).
fn iso_bmff_brand(sample: &[u8]) -> Option<&[u8]> {
    if sample.len() >= 12 && &sample[4..8] == b"ftyp" {
        Some(&sample[8..12])
    } else {
        None
    }
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len() && data[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn matches_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if !starts_with_ignore_case(data, tag) {
        return false;
    }
    // Comments need no terminator.
    if tag == b"<!--" {
        return true;
    }
    matches!(data.get(tag.len()), Some(b' ' | b'>'))
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
