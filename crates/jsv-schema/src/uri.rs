//! Strict parsing of URI references
//!
//! `url::Url` is lenient: it percent-encodes stray characters and happily
//! joins inputs such as `":"` as relative paths. References written into
//! documents are checked against RFC 3986 syntax first so that malformed
//! input is reported instead of silently repaired.

use url::Url;

use crate::{Error, Result};

/// Parse `input` as a URI reference, resolving it against `namespace` when it
/// is relative.
///
/// # Errors
///
/// Returns [`Error::UriSyntax`] when `input` is not a syntactically valid URI
/// reference, or when it is relative and no namespace is available.
pub fn parse_reference(input: &str, namespace: Option<&Url>) -> Result<Url> {
    check_characters(input)?;

    if has_scheme(input)? {
        return Url::parse(input).map_err(|e| Error::uri_syntax(input, e.to_string()));
    }

    let base = namespace.ok_or_else(|| {
        Error::uri_syntax(input, "relative reference without a namespace root")
    })?;
    base.join(input)
        .map_err(|e| Error::uri_syntax(input, e.to_string()))
}

/// Parse `input` as an absolute URI.
///
/// # Errors
///
/// Returns [`Error::UriSyntax`] for malformed input and for relative
/// references.
pub fn parse_absolute(input: &str) -> Result<Url> {
    check_characters(input)?;
    if !has_scheme(input)? {
        return Err(Error::uri_syntax(input, "URI must be absolute"));
    }
    Url::parse(input).map_err(|e| Error::uri_syntax(input, e.to_string()))
}

/// Decide whether the reference starts with a scheme, validating the scheme
/// name when one is present.
fn has_scheme(input: &str) -> Result<bool> {
    let Some(end) = input.find([':', '/', '?', '#']) else {
        return Ok(false);
    };
    if input.as_bytes()[end] != b':' {
        return Ok(false);
    }
    if end == 0 {
        return Err(Error::uri_syntax(input, "Expected scheme name at index 0"));
    }

    for (index, c) in input[..end].char_indices() {
        let valid = if index == 0 {
            c.is_ascii_alphabetic()
        } else {
            c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
        };
        if !valid {
            return Err(Error::uri_syntax(
                input,
                format!("Illegal character in scheme name at index {index}"),
            ));
        }
    }
    Ok(true)
}

fn check_characters(input: &str) -> Result<()> {
    let bytes = input.as_bytes();
    let mut in_fragment = false;

    for (index, c) in input.char_indices() {
        match c {
            '%' => {
                let hex = bytes.get(index + 1..index + 3);
                if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                    return Err(Error::uri_syntax(
                        input,
                        format!("Malformed escape pair at index {index}"),
                    ));
                }
            }
            '#' if in_fragment => {
                return Err(Error::uri_syntax(
                    input,
                    format!("Illegal character in fragment at index {index}"),
                ));
            }
            '#' => in_fragment = true,
            c if c.is_ascii_alphanumeric() => {}
            '-' | '.' | '_' | '~' | ':' | '/' | '?' | '[' | ']' | '@' | '!' | '$' | '&'
            | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' => {}
            c if !c.is_ascii() && !c.is_whitespace() && !c.is_control() => {}
            _ => {
                return Err(Error::uri_syntax(
                    input,
                    format!("Illegal character at index {index}"),
                ));
            }
        }
    }
    Ok(())
}
