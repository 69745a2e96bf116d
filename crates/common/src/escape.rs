//! Percent and form escaping.
//!
//! Form fields use `application/x-www-form-urlencoded`: space becomes `+`
//! and every byte outside `[A-Za-z0-9-_.~]` is percent-encoded.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything except the urlencoded-unreserved set `[A-Za-z0-9-_.~]`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single component (form field name or value, URL query
/// piece) leaving only unreserved bytes literal.
pub fn percent_encode_component(s: &str) -> String {
    utf8_percent_encode(s, FORM).to_string()
}

/// Decode `%XX` escapes; invalid escapes pass through unchanged. Lossy on
/// non-UTF-8 output.
pub fn percent_decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Encode one form field as `name=value` with `' ' → '+'`.
pub fn form_urlencode(name: &str, value: &str) -> String {
    fn field(s: &str) -> String {
        // '+' for spaces, percent escapes for the rest
        utf8_percent_encode(s, FORM)
            .to_string()
            .replace("%20", "+")
    }
    format!("{}={}", field(name), field(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_keeps_unreserved() {
        assert_eq!(percent_encode_component("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode_component("a b"), "a%20b");
        assert_eq!(percent_encode_component("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn form_space_is_plus() {
        assert_eq!(form_urlencode("q", "a b"), "q=a+b");
    }

    #[test]
    fn form_escapes_reserved() {
        assert_eq!(form_urlencode("k", "a&b=c"), "k=a%26b%3Dc");
    }

    #[test]
    fn decode_roundtrip() {
        assert_eq!(percent_decode("a%20b%2Fc"), "a b/c");
        assert_eq!(percent_decode("plain"), "plain");
    }

    #[test]
    fn decode_invalid_escape_passthrough() {
        assert_eq!(percent_decode("100%"), "100%");
    }
}
