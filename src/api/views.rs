//! Server-rendered HTML for the browse page.

use crate::services::dropbox::Entry;
use crate::utils::paths::{self, PathElement};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write;

pub struct HomePage<'a> {
    pub path: &'a str,
    pub breadcrumbs: Vec<PathElement>,
    pub entries: &'a [Entry],
    pub notification: Option<&'a str>,
}

fn format_size(size: Option<u64>) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let Some(size) = size else {
        return String::new();
    };

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn render_breadcrumbs(out: &mut String, breadcrumbs: &[PathElement]) {
    out.push_str("<nav class=\"breadcrumbs\" id=\"breadcrumbs\">");
    for (idx, element) in breadcrumbs.iter().enumerate() {
        if idx > 0 {
            out.push_str(" <span class=\"separator\">/</span> ");
        }
        let name = text(&element.name);
        match &element.link {
            Some(link) => {
                let _ = write!(out, "<a href=\"{}\">{}</a>", attr(link), name);
            }
            None => {
                let _ = write!(out, "<span class=\"current\">{}</span>", name);
            }
        }
    }
    out.push_str("</nav>\n");
}

fn render_row(out: &mut String, entry: &Entry) {
    let path = entry.path();
    let (icon, link) = if entry.is_folder() {
        ("&#128193;", paths::browse_link(&path))
    } else {
        ("&#128196;", paths::download_link(&path))
    };

    let _ = write!(
        out,
        "<tr class=\"entry\" data-path=\"{path}\" data-name=\"{name}\" data-folder=\"{folder}\">\
<td><input type=\"checkbox\" class=\"select\"></td>\
<td>{icon} <a href=\"{link}\">{label}</a></td>\
<td class=\"size\">{size}</td>\
<td class=\"modified\">{modified}</td></tr>\n",
        path = attr(&path),
        name = attr(&entry.name),
        folder = entry.is_folder(),
        icon = icon,
        link = attr(&link),
        label = text(&entry.name),
        size = format_size(entry.size),
        modified = text(entry.server_modified.as_deref().unwrap_or("")),
    );
}

pub fn render_home(page: &HomePage<'_>) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>CloudStash</title>\n<link rel=\"stylesheet\" href=\"/public/style.css\">\n</head>\n",
    );
    let _ = writeln!(
        out,
        "<body data-path=\"{}\">",
        attr(if page.path.is_empty() { "/" } else { page.path })
    );

    out.push_str("<header>\n<h1>CloudStash</h1>\n<a id=\"logout\" href=\"/logout\">Log out</a>\n</header>\n");

    if let Some(message) = page.notification {
        let _ = writeln!(
            out,
            "<div class=\"notification\" id=\"notification\">{}</div>",
            text(message)
        );
    }

    render_breadcrumbs(&mut out, &page.breadcrumbs);

    out.push_str(
        "<div class=\"toolbar\">\
<button id=\"btnCreateFolder\">New folder</button>\
<button id=\"btnRename\" hidden>Rename</button>\
<button id=\"btnMove\" hidden>Move</button>\
<button id=\"btnCopy\" hidden>Copy</button>\
<button id=\"btnDelete\" hidden>Delete</button>\
<span id=\"jobStatus\"></span></div>\n",
    );

    out.push_str(
        "<table id=\"filesTable\">\n<thead><tr><th></th><th>Name</th><th>Size</th><th>Modified</th></tr></thead>\n<tbody>\n",
    );
    if page.entries.is_empty() {
        out.push_str("<tr class=\"empty\"><td colspan=\"4\">This folder is empty</td></tr>\n");
    }
    for entry in page.entries {
        render_row(&mut out, entry);
    }
    out.push_str("</tbody>\n</table>\n");

    out.push_str("<script src=\"/public/script.js\"></script>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dropbox::EntryTag;

    fn entry(tag: EntryTag, path: &str, size: Option<u64>) -> Entry {
        Entry {
            tag,
            name: paths::basename(path).to_string(),
            path_lower: Some(path.to_lowercase()),
            path_display: Some(path.to_string()),
            id: None,
            size,
            server_modified: None,
        }
    }

    #[test]
    fn test_quotes_in_names_cannot_break_attributes() {
        let entries = vec![entry(EntryTag::File, "/say \"hi\" & <b>.txt", Some(1))];
        let page = HomePage {
            path: "",
            breadcrumbs: paths::breadcrumbs(""),
            entries: &entries,
            notification: Some("<script>alert(1)</script>"),
        };
        let html = render_home(&page);

        assert!(html.contains("data-name=\"say &quot;hi&quot; &amp; &lt;b&gt;.txt\""));
        assert!(html.contains(">say \"hi\" &amp; &lt;b&gt;.txt</a>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "");
        assert_eq!(format_size(Some(512)), "512 B");
        assert_eq!(format_size(Some(1536)), "1.5 KB");
        assert_eq!(format_size(Some(5 * 1024 * 1024)), "5.0 MB");
    }

    #[test]
    fn test_render_home() {
        let entries = vec![
            entry(EntryTag::Folder, "/Docs/Work", None),
            entry(EntryTag::File, "/Docs/<notes>.txt", Some(10)),
        ];
        let page = HomePage {
            path: "/Docs",
            breadcrumbs: paths::breadcrumbs("/Docs"),
            entries: &entries,
            notification: Some("Deleted file: a.txt"),
        };
        let html = render_home(&page);

        assert!(html.contains("<a href=\"/\">Home</a>"));
        assert!(html.contains("<span class=\"current\">Docs</span>"));
        assert!(html.contains("href=\"/browse/Docs/Work\""));
        assert!(html.contains("data-name=\"&lt;notes&gt;.txt\""));
        assert!(html.contains("data-folder=\"true\""));
        assert!(html.contains("Deleted file: a.txt"));
        assert!(html.contains("/public/script.js"));
        assert!(!html.contains("<notes>"));
    }

    #[test]
    fn test_render_empty_folder_without_notification() {
        let page = HomePage {
            path: "",
            breadcrumbs: paths::breadcrumbs(""),
            entries: &[],
            notification: None,
        };
        let html = render_home(&page);
        assert!(html.contains("This folder is empty"));
        assert!(!html.contains("id=\"notification\""));
    }
}
