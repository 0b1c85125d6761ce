// Repository file browsing helpers.
// Listing order, breadcrumb segments, and inline file decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{DashError, Result};
use crate::github::{ContentItem, ContentKind, FileContent};

/// Directories first, then case-insensitive by name.
pub fn sort_listing(items: &mut [ContentItem]) {
    items.sort_by(|a, b| {
        let a_dir = a.kind == ContentKind::Dir;
        let b_dir = b.kind == ContentKind::Dir;
        b_dir
            .cmp(&a_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Path segments for a breadcrumb trail; the root has none.
pub fn breadcrumbs(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Decode an inlined file body.
///
/// Returns `None` when the API did not inline the body or used an encoding
/// other than base64 (large files come back with `encoding: "none"`). The
/// text is decoded lossily so binary files still render something.
pub fn decode_file(file: &FileContent) -> Result<Option<String>> {
    let (Some("base64"), Some(content)) = (file.encoding.as_deref(), file.content.as_deref())
    else {
        return Ok(None);
    };

    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned)
        .map_err(|e| DashError::Decode(format!("{}: {}", file.path, e)))?;

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, kind: ContentKind) -> ContentItem {
        ContentItem {
            name: name.to_string(),
            path: name.to_string(),
            sha: name.to_string(),
            kind,
            size: 0,
            html_url: None,
            download_url: None,
        }
    }

    fn file(encoding: Option<&str>, content: Option<&str>) -> FileContent {
        FileContent {
            name: "README.md".into(),
            path: "docs/README.md".into(),
            sha: "abc".into(),
            size: 0,
            encoding: encoding.map(str::to_string),
            content: content.map(str::to_string),
            html_url: None,
            download_url: None,
        }
    }

    #[test]
    fn test_sort_listing_dirs_first() {
        let mut items = vec![
            item("zebra.rs", ContentKind::File),
            item("src", ContentKind::Dir),
            item("Cargo.toml", ContentKind::File),
            item(".github", ContentKind::Dir),
        ];
        sort_listing(&mut items);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, [".github", "src", "Cargo.toml", "zebra.rs"]);
    }

    #[test]
    fn test_breadcrumbs() {
        assert!(breadcrumbs("").is_empty());
        assert_eq!(breadcrumbs("/src/cache/"), ["src", "cache"]);
    }

    #[test]
    fn test_decode_wrapped_base64() {
        // GitHub wraps base64 bodies at 60 columns.
        let decoded = decode_file(&file(Some("base64"), Some("IyBIZWxs\nbyB3b3Js\nZAo=\n")))
            .unwrap()
            .unwrap();
        assert_eq!(decoded, "# Hello world\n");
    }

    #[test]
    fn test_decode_skips_non_inline_bodies() {
        assert!(decode_file(&file(Some("none"), Some(""))).unwrap().is_none());
        assert!(decode_file(&file(Some("base64"), None)).unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_file(&file(Some("base64"), Some("@@@"))).unwrap_err();
        assert!(matches!(err, DashError::Decode(_)));
    }
}
