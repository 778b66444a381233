use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use utoipa::ToSchema;

/// Characters escaped inside one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One element of the breadcrumb trail. The current folder has no link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PathElement {
    pub name: String,
    pub link: Option<String>,
}

/// Provider form of a path: `""` for the root, otherwise `/a/b` without
/// empty segments or a trailing slash.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        String::new()
    } else {
        format!("/{}", segments.join("/"))
    }
}

pub fn join(parent: &str, name: &str) -> String {
    format!("{}/{}", normalize(parent), name)
}

pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

pub fn parent(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// Browse page URL for a folder
pub fn browse_link(path: &str) -> String {
    let path = normalize(path);
    if path.is_empty() {
        return "/".to_string();
    }

    let mut link = String::from("/browse");
    for segment in path.split('/').skip(1) {
        link.push('/');
        link.extend(utf8_percent_encode(segment, SEGMENT));
    }
    link
}

pub fn download_link(path: &str) -> String {
    format!("/download?file={}", utf8_percent_encode(path, NON_ALPHANUMERIC))
}

/// Breadcrumb trail for a folder path: `Home`, then one element per segment
/// linking to its cumulative path. The last element is left unlinked.
pub fn breadcrumbs(dirpath: &str) -> Vec<PathElement> {
    let mut elements = vec![PathElement {
        name: "Home".to_string(),
        link: Some("/".to_string()),
    }];

    let mut current = String::new();
    for segment in dirpath.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        elements.push(PathElement {
            name: segment.to_string(),
            link: Some(browse_link(&current)),
        });
    }

    if let Some(last) = elements.last_mut() {
        last.link = None;
    }
    elements
}
