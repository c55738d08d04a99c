//! Byte-input decoding for the streaming reader.
//!
//! The stream tokenizer works on UTF-8 text. Byte input is sniffed for a
//! Byte Order Mark first and then for an `encoding="..."` pseudo-attribute
//! in the XML declaration; anything other than UTF-8 is transcoded through
//! `encoding_rs`.

use thiserror::Error;

/// Failure to turn raw bytes into UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The declared or sniffed encoding label is not known.
    #[error("unsupported encoding: {0}")]
    Unsupported(String),
    /// The bytes are not valid in the detected encoding.
    #[error("malformed byte sequence for encoding {0}")]
    Malformed(String),
}

/// Detects the encoding of an XML byte stream by inspecting the Byte Order Mark.
///
/// Returns `(encoding label, BOM length)`. Input without a BOM is reported
/// as UTF-8 with nothing to skip.
///
/// # Examples
///
/// ```
/// use lazydom::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<a/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<a/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Decodes `bytes` in the encoding named by `label`.
///
/// # Errors
///
/// Returns [`EncodingError::Unsupported`] for an unknown label and
/// [`EncodingError::Malformed`] when the bytes do not decode cleanly.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::Unsupported(label.to_string()))?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::Malformed(encoding.name().to_string()));
    }
    Ok(text.into_owned())
}

/// Decodes raw XML bytes into UTF-8, detecting the encoding automatically.
///
/// A BOM decides the initial encoding. For BOM-less input the XML
/// declaration, which is always ASCII-compatible in that case, may name a
/// different encoding.
///
/// # Errors
///
/// Returns `EncodingError` if the detected encoding is unknown or the bytes
/// are malformed for it.
///
/// # Examples
///
/// ```
/// use lazydom::encoding::decode_to_utf8;
///
/// let text = decode_to_utf8(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xE9</a>").unwrap();
/// assert!(text.ends_with("<a>caf\u{e9}</a>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_encoding, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];

    if skip > 0 && bom_encoding != "UTF-8" {
        return transcode(content, bom_encoding);
    }

    match declared_encoding(content) {
        Some(label) if !is_utf8_label(&label) => transcode(content, &label),
        _ => std::str::from_utf8(content)
            .map(str::to_string)
            .map_err(|_| EncodingError::Malformed("UTF-8".to_string())),
    }
}

/// Extracts the `encoding` pseudo-attribute of a leading XML declaration,
/// scanning the bytes as ASCII.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(256)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..end];
    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = trim_ascii_start(&decl[at + 8..]);
    let rest = trim_ascii_start(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..len];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}
