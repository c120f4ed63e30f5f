//! Cookie read/write helpers over the document cookie jar

use std::fmt::Write;

use crate::Document;

/// `SameSite` cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "strict",
            SameSite::Lax => "lax",
            SameSite::None => "none",
        }
    }
}

/// Attributes written alongside a cookie
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub secure: bool,
    pub same_site: Option<SameSite>,
    /// Lifetime in seconds; zero or negative deletes the cookie
    pub max_age: Option<i64>,
    /// Expiry as an HTTP date string
    pub expires: Option<String>,
}

impl CookieOptions {
    /// Options with `path=/`
    pub fn root() -> Self {
        Self {
            path: Some("/".into()),
            ..Default::default()
        }
    }
}

fn encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'!' | b'*'
            | b'\'' | b'(' | b')' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

fn hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Serialize a cookie the way the `document.cookie` setter expects
pub fn serialize(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut header = format!("{}={}", encode(name), encode(value));
    if let Some(path) = &options.path {
        let _ = write!(header, "; path={path}");
    }
    if let Some(max_age) = options.max_age {
        let _ = write!(header, "; max-age={max_age}");
    }
    if let Some(expires) = &options.expires {
        let _ = write!(header, "; expires={expires}");
    }
    if let Some(same_site) = options.same_site {
        let _ = write!(header, "; samesite={}", same_site.as_str());
    }
    if options.secure {
        header.push_str("; secure");
    }
    header
}

/// Write a cookie into the document, returning the serialized string
pub fn set_cookie(doc: &mut Document, name: &str, value: &str, options: &CookieOptions) -> String {
    let header = serialize(name, value, options);
    doc.write_cookie(&header);
    header
}

/// Read a cookie value by name
pub fn get_cookie(doc: &Document, name: &str) -> Option<String> {
    let wanted = encode(name);
    doc.cookie()
        .split("; ")
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == wanted)
        .map(|(_, v)| decode(v))
}

/// Delete a cookie by writing it with `max-age=0`
pub fn remove_cookie(doc: &mut Document, name: &str) {
    let options = CookieOptions {
        max_age: Some(0),
        ..CookieOptions::root()
    };
    set_cookie(doc, name, "", &options);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_with_options() {
        let options = CookieOptions {
            path: Some("/".into()),
            secure: true,
            same_site: Some(SameSite::Lax),
            max_age: Some(3600),
            expires: None,
        };
        assert_eq!(
            serialize("session", "a b;c", &options),
            "session=a%20b%3Bc; path=/; max-age=3600; samesite=lax; secure"
        );
    }

    #[test]
    fn test_set_get_remove() {
        let mut doc = Document::new();
        set_cookie(&mut doc, "greeting", "hello world", &CookieOptions::root());
        set_cookie(&mut doc, "theme", "dark", &CookieOptions::default());

        assert_eq!(get_cookie(&doc, "greeting").as_deref(), Some("hello world"));
        assert_eq!(get_cookie(&doc, "theme").as_deref(), Some("dark"));
        assert_eq!(get_cookie(&doc, "missing"), None);

        remove_cookie(&mut doc, "greeting");
        assert_eq!(get_cookie(&doc, "greeting"), None);
        assert_eq!(doc.cookie(), "theme=dark");
    }

    #[test]
    fn test_decode_keeps_malformed_escapes() {
        assert_eq!(decode("100%"), "100%");
        assert_eq!(decode("%zz"), "%zz");
        assert_eq!(decode("caf%C3%A9"), "café");
    }
}
