//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded header words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match data.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => {
                i += 3;
                continue;
            }
            Some([b'\n', _]) => {
                i += 2;
                continue;
            }
            _ => {}
        }
        if data.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        let hex = data
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex = std::str::from_utf8(hex)
            .map_err(|_| Error::InvalidEncoding("Non-ASCII escape sequence".to_string()))?;
        let value = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(value);
        i += 3;
    }

    Ok(result)
}

/// Decodes a single RFC 2047 encoded word (`=?charset?encoding?text?=`).
///
/// Charsets other than UTF-8 and ASCII are decoded lossily as UTF-8.
///
/// # Errors
///
/// Returns an error if the word is malformed or uses an unknown encoding.
pub fn decode_rfc2047(word: &str) -> Result<String> {
    if !word.starts_with("=?") || !word.ends_with("?=") || word.len() < 4 {
        return Ok(word.to_string());
    }

    let inner = &word[2..word.len() - 2];
    let parts: Vec<&str> = inner.splitn(3, '?').collect();

    if parts.len() != 3 {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    }

    let encoding = parts[1].to_uppercase();
    let encoded_text = parts[2];

    let bytes = match encoding.as_str() {
        "B" => decode_base64(encoded_text)?,
        "Q" => {
            // Underscore stands for space in the Q encoding
            let text_with_spaces = encoded_text.replace('_', " ");
            decode_quoted_printable(text_with_spaces.as_bytes())?
        }
        _ => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {encoding}"
            )));
        }
    };

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decodes every encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped, as RFC 2047
/// requires. Words that fail to decode are kept verbatim.
#[must_use]
pub fn decode_header_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut last_was_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, tail) = rest.split_at(start);
        let Some(end) = find_word_end(tail) else {
            break;
        };

        if !(last_was_word && before.trim().is_empty()) {
            out.push_str(before);
        }

        let word = &tail[..end];
        match decode_rfc2047(word) {
            Ok(decoded) => out.push_str(&decoded),
            Err(_) => out.push_str(word),
        }
        last_was_word = true;
        rest = &tail[end..];
    }

    out.push_str(rest);
    out
}

/// Finds the end (exclusive) of an encoded word that starts at offset 0.
fn find_word_end(s: &str) -> Option<usize> {
    // =?charset?X?text?= : skip the two inner '?' delimiters first
    let charset_end = s[2..].find('?')? + 2;
    let encoding_end = s[charset_end + 1..].find('?')? + charset_end + 1;
    let close = s[encoding_end + 1..].find("?=")? + encoding_end + 1;
    Some(close + 2)
}
