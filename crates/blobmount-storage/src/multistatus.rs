//! Decoding of WebDAV `multistatus` documents returned by PROPFIND.
//!
//! Only the `href` of each `response` entry is extracted. Namespace prefixes
//! vary between servers (`D:`, `d:`, none), so elements are matched on their
//! local name.

use xmlparser::{ElementEnd, Token, Tokenizer};

use blobmount_types::error::{BlobmountError, Result};

/// Return the `href` of every `response` in document order.
pub fn parse_hrefs(xml: &str) -> Result<Vec<String>> {
    let mut stack: Vec<String> = Vec::new();
    let mut hrefs = Vec::new();
    let mut current: Option<String> = None;
    let mut saw_root = false;

    for token in Tokenizer::from(xml) {
        let token = token.map_err(|e| {
            BlobmountError::RemoteProtocol(format!("malformed multistatus document: {e}"))
        })?;
        match token {
            Token::ElementStart { local, .. } => {
                let local = local.as_str();
                if !saw_root {
                    if local != "multistatus" {
                        return Err(BlobmountError::RemoteProtocol(format!(
                            "expected multistatus root element, found '{local}'"
                        )));
                    }
                    saw_root = true;
                }
                if local == "href" && stack.last().map(String::as_str) == Some("response") {
                    current = Some(String::new());
                }
                stack.push(local.to_string());
            }
            Token::Text { text } | Token::Cdata { text, .. } => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(text.as_str());
                }
            }
            Token::ElementEnd { end, .. } => match end {
                ElementEnd::Open => {}
                ElementEnd::Close(_, local) => {
                    if stack.last().map(String::as_str) != Some(local.as_str()) {
                        return Err(BlobmountError::RemoteProtocol(format!(
                            "mismatched closing tag '{}' in multistatus document",
                            local.as_str()
                        )));
                    }
                    stack.pop();
                    if local.as_str() == "href" {
                        if let Some(raw) = current.take() {
                            let href = unescape(raw.trim())?;
                            if !href.is_empty() {
                                hrefs.push(href);
                            }
                        }
                    }
                }
                ElementEnd::Empty => {
                    // `<href/>` names nothing.
                    if stack.pop().as_deref() == Some("href") {
                        current = None;
                    }
                }
            },
            _ => {}
        }
    }

    if !saw_root {
        return Err(BlobmountError::RemoteProtocol(
            "empty multistatus document".into(),
        ));
    }
    if !stack.is_empty() {
        return Err(BlobmountError::RemoteProtocol(
            "truncated multistatus document".into(),
        ));
    }
    Ok(hrefs)
}

/// Final path segment of an href, ignoring a trailing slash.
pub fn entry_name(href: &str) -> &str {
    let trimmed = href.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Resolve the predefined entities and numeric character references.
fn unescape(s: &str) -> Result<String> {
    if !s.contains('&') {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let semi = tail.find(';').ok_or_else(|| {
            BlobmountError::RemoteProtocol(format!(
                "unterminated entity reference in href '{s}'"
            ))
        })?;
        out.push(decode_entity(&tail[..semi])?);
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn decode_entity(entity: &str) -> Result<char> {
    let decoded = match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => match entity.strip_prefix('#') {
            Some(num) => {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
            }
            None => None,
        },
    };
    decoded.ok_or_else(|| {
        BlobmountError::RemoteProtocol(format!(
            "invalid entity reference '&{entity};' in multistatus document"
        ))
    })
}
