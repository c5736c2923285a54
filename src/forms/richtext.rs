//! Link insertion for the rich-text editor.

use serde::Serialize;
use url::Url;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Placeholder target for rejected links.
pub const REJECTED_HREF: &str = "#";

/// Return a safe `href` for `raw`, or `"#"`.
///
/// Accepts `http:`, `https:`, `mailto:` and `tel:` URLs, relative paths, and
/// bare hosts that become valid once `https://` is prefixed.
pub fn sanitize_link_url(raw: &str) -> String {
    let url = raw.trim();
    if url.is_empty() {
        return REJECTED_HREF.to_string();
    }

    // Protocol-relative, resolve against https.
    if let Some(rest) = url.strip_prefix("//") {
        return prefixed(rest);
    }

    if is_relative(url) {
        return url.to_string();
    }

    match Url::parse(url) {
        Ok(parsed) if ALLOWED_SCHEMES.contains(&parsed.scheme()) => url.to_string(),
        Ok(_) => REJECTED_HREF.to_string(),
        Err(_) => prefixed(url),
    }
}

fn is_relative(url: &str) -> bool {
    ["/", "./", "../", "#", "?"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

fn prefixed(url: &str) -> String {
    let candidate = format!("https://{}", url);
    match Url::parse(&candidate) {
        Ok(parsed) if parsed.host_str().is_some_and(|host| !host.is_empty()) => candidate,
        _ => REJECTED_HREF.to_string(),
    }
}

/// Escape text for insertion into HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// An anchor ready to be inserted into the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInsertion {
    pub href: String,
    pub html: String,
}

/// A link the editor refused to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRejected {
    pub href: String,
    pub alert: String,
}

impl std::fmt::Display for LinkRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.alert)
    }
}

impl std::error::Error for LinkRejected {}

/// Build the anchor for `text` pointing at `url`. Empty text shows the URL.
pub fn insert_link(text: &str, url: &str) -> Result<LinkInsertion, LinkRejected> {
    let href = sanitize_link_url(url);
    if href == REJECTED_HREF && url.trim() != REJECTED_HREF {
        return Err(LinkRejected {
            href,
            alert: format!(
                "The link \"{}\" is not allowed. Use an http(s), mailto or tel address.",
                url.trim()
            ),
        });
    }

    let label = if text.trim().is_empty() { url.trim() } else { text };
    let html = format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        escape_html(&href),
        escape_html(label)
    );
    Ok(LinkInsertion { href, html })
}
