use std::fmt;

/// A navigation target: path, query pairs and an optional fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub hash: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Location {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Splits a full path such as `/calculator?from=SG#top` into its parts.
    pub fn parse(full_path: &str) -> Self {
        let (rest, hash) = match full_path.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_string())),
            None => (full_path, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (rest, Vec::new()),
        };
        let path = if path.is_empty() { "/" } else { path };
        Location {
            path: path.to_string(),
            query,
            hash,
        }
    }

    /// The first value for `key`, decoded.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let separator = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", separator, encode(key), encode(value))?;
        }
        if let Some(hash) = &self.hash {
            write!(f, "#{}", hash)?;
        }
        Ok(())
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

// Only characters that would change how the query is parsed are escaped, so a
// redirect parameter reads as `/login?redirect=/user-dashboard`.
fn encode(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        if matches!(c, '%' | '&' | '=' | '#' | '+' | '?') || c.is_whitespace() || c.is_control()
        {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn decode(component: &str) -> String {
    let bytes = component.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match (hex_value(bytes.get(i + 1)), hex_value(bytes.get(i + 2))) {
                (Some(high), Some(low)) => {
                    out.push((high << 4) | low);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    (*byte? as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_location_keeps_slashes_readable() {
        let location = Location::new("/login").with_query("redirect", "/user-dashboard");
        assert_eq!(location.to_string(), "/login?redirect=/user-dashboard");
    }

    #[test]
    fn test_nested_query_is_escaped_and_recovered() {
        let location =
            Location::new("/login").with_query("redirect", "/calculator?from=SG&to=US#result");
        let rendered = location.to_string();
        assert_eq!(
            rendered,
            "/login?redirect=/calculator%3Ffrom%3DSG%26to%3DUS%23result"
        );

        let parsed = Location::parse(&rendered);
        assert_eq!(parsed.path, "/login");
        assert_eq!(
            parsed.query_value("redirect"),
            Some("/calculator?from=SG&to=US#result")
        );
    }

    #[test]
    fn test_parse_splits_path_query_and_hash() {
        let location = Location::parse("/calculator?from=SG&empty#top");
        assert_eq!(location.path, "/calculator");
        assert_eq!(location.query_value("from"), Some("SG"));
        assert_eq!(location.query_value("empty"), Some(""));
        assert_eq!(location.hash.as_deref(), Some("top"));
    }

    #[test]
    fn test_parse_empty_path_is_root() {
        assert_eq!(Location::parse("").path, "/");
        assert_eq!(Location::parse("?x=1").path, "/");
    }

    #[test]
    fn test_decode_tolerates_stray_percent() {
        assert_eq!(decode("100%"), "100%");
        assert_eq!(decode("a%zzb"), "a%zzb");
        assert_eq!(decode("a+b%20c"), "a b c");
    }
}
