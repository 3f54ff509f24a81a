//! Embedded HTML pages
//!
//! Pages are compiled into the binary and filled by plain `{{ key }}`
//! substitution.

const ERROR_TEMPLATE: &str = include_str!("error.html");
const LIST_TEMPLATE: &str = include_str!("list.html");
const LOGIN_TEMPLATE: &str = include_str!("login.html");

/// Render the error page
pub fn error_page(status: u16, url: &str, message: &str) -> String {
    let title = format!("{status} {url}");
    render(
        ERROR_TEMPLATE,
        &[
            ("title", &escape_html(&title)),
            ("status", &status.to_string()),
            ("message", &escape_html(message)),
        ],
    )
}

/// Render the password prompt
pub fn login_page() -> String {
    LOGIN_TEMPLATE.to_string()
}

/// Render a directory listing
///
/// `files_json` is inserted into a `<script>` block as-is, so the caller must
/// have escaped every `<`.
pub fn listing_page(title: &str, files_json: &str) -> String {
    render(
        LIST_TEMPLATE,
        &[
            ("title", &escape_html(title)),
            ("version", env!("CARGO_PKG_VERSION")),
            ("files", files_json),
        ],
    )
}

/// Single pass over the template; inserted values are never rescanned
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 2..];
        let Some(close) = tail.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = tail[..close].trim();
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            // Unknown placeholders are left as written
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &tail[close + 2..];
    }

    out.push_str(rest);
    out
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_page() {
        let page = error_page(404, "/missing", "/missing was not found!");
        assert!(page.contains("<title>404 /missing</title>"));
        assert!(page.contains("<h1>404</h1>"));
        assert!(page.contains("/missing was not found!"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_error_page_escapes_url() {
        let page = error_page(404, "/<script>", "x");
        assert!(page.contains("404 /&lt;script&gt;"));
        assert!(!page.contains("/<script>"));
    }

    #[test]
    fn test_listing_page() {
        let page = listing_page("/docs/", "[{\"type\":\"file\"}]");
        assert!(page.contains("<title>/docs/</title>"));
        assert!(page.contains("const files = [{\"type\":\"file\"}];"));
        assert!(page.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_inserted_values_are_not_rescanned() {
        let page = listing_page("/{{ files }}/", "[\"<img>\"]");
        assert!(page.contains("<h1>/{{ files }}/</h1>"));
        assert_eq!(page.matches("[\"<img>\"]").count(), 1);

        let page = render("{{ a }}|{{ b }}|{{ c }}", &[("a", "{{ b }}"), ("b", "B")]);
        assert_eq!(page, "{{ b }}|B|{{ c }}");
    }

    #[test]
    fn test_login_page_posts_to_login() {
        let page = login_page();
        assert!(page.contains("action=\"/login\""));
        assert!(page.contains("name=\"password\""));
        assert!(page.contains("name=\"page\""));
    }
}
