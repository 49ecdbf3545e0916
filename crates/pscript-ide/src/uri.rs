//! `file://` uri helpers. Uris are kept as plain strings throughout the
//! core and used verbatim as map keys.

use std::path::{Path, PathBuf};

/// Build a `file://` uri from a filesystem path.
pub fn path_to_uri(path: &Path) -> String {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let encoded = percent_encode(&path_str);
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

/// Extract the filesystem path from a `file://` uri.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // Drop an authority such as `localhost`.
    let path = &rest[rest.find('/')?..];
    Some(PathBuf::from(percent_decode(path)))
}

/// Everything up to and including the last `/`.
pub fn uri_directory(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(i) => &uri[..=i],
        None => "",
    }
}

/// Last path segment without its extension, percent-decoded.
pub fn uri_stem(uri: &str) -> Option<String> {
    let file = &uri[uri.rfind('/').map_or(0, |i| i + 1)..];
    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(i) => &file[..i],
    };
    (!stem.is_empty()).then(|| percent_decode(stem))
}

fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'/' | b'-' | b'_' | b'.' | b'~' | b':' => {
                result.push(byte as char)
            }
            _ => result.push_str(&format!("%{byte:02X}")),
        }
    }
    result
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            decoded.push(byte);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_uri_round_trip() {
        let path = Path::new("/work/My Project/ünit.pas");
        let uri = path_to_uri(path);
        assert_eq!(uri, "file:///work/My%20Project/%C3%BCnit.pas");
        assert_eq!(uri_to_path(&uri), Some(path.to_path_buf()));
    }

    #[test]
    fn test_non_file_uri() {
        assert_eq!(uri_to_path("untitled:Untitled-1"), None);
    }

    #[test]
    fn test_directory_and_stem() {
        let uri = "file:///src/lib/Shapes.pas";
        assert_eq!(uri_directory(uri), "file:///src/lib/");
        assert_eq!(uri_stem(uri).as_deref(), Some("Shapes"));
        assert_eq!(uri_stem("file:///src/.hidden").as_deref(), Some(".hidden"));
        assert_eq!(uri_stem("file:///src/").as_deref(), None);
    }
}
