//! Best-effort extraction of login form details from identity server HTML.
//!
//! The login page is not a versioned interface, so every extractor here is
//! independent and degrades to "not found" instead of failing. The caller
//! decides which absences are fatal.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Name of the hidden anti-forgery input rendered by the login page.
pub const ANTIFORGERY_FIELD: &str = "__RequestVerificationToken";

/// Name of the hidden return-URL input rendered by the login page.
pub const RETURN_URL_FIELD: &str = "ReturnUrl";

static FORM_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<form\b[^>]*?\saction\s*=\s*(?:"([^"]+)"|'([^']+)')"#)
        .expect("form action regex")
});

static INPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("input tag regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute regex")
});

static ALERT_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<[a-z][a-z0-9]*\b[^>]*?\sclass\s*=\s*(?:"[^"]*alert[^"]*"|'[^']*alert[^']*')[^>]*>"#,
    )
    .expect("alert regex")
});

/// Elements that never get a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity regex")
});

/// Value of the `code` query parameter in a redirect location.
///
/// Works on absolute and relative locations. Blank values count as absent.
pub fn extract_code(url: &str) -> Option<String> {
    query_param(url, "code")
}

/// The `action` attribute of the first `<form>` on the page.
pub fn extract_form_action(html: &str) -> Option<String> {
    FORM_ACTION
        .captures(html)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| decode_entities(m.as_str()))
}

/// Hidden anti-forgery token, or an empty string when the page has none.
pub fn extract_antiforgery_token(html: &str) -> String {
    input_value(html, ANTIFORGERY_FIELD).unwrap_or_default()
}

/// Hidden `ReturnUrl` input, or an empty string when the page has none.
pub fn extract_return_url(html: &str) -> String {
    input_value(html, RETURN_URL_FIELD).unwrap_or_default()
}

/// Trimmed text of the first element whose class contains "alert".
///
/// Empty alerts are skipped in favour of the next one.
pub fn extract_error_message(html: &str) -> Option<String> {
    ALERT_OPEN
        .find_iter(html)
        .find_map(|open| alert_text(&html[open.end()..]))
}

/// First non-blank text node before the element that `rest` starts inside
/// is closed.
fn alert_text(rest: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = 0;

    for tag in TAG.find_iter(rest) {
        let text = rest[start..tag.start()].trim();
        if !text.is_empty() {
            return Some(decode_entities(text));
        }
        start = tag.end();

        let tag = tag.as_str();
        if tag.starts_with("</") {
            if depth == 0 {
                return None;
            }
            depth -= 1;
        } else if !tag.starts_with("<!") && !tag.ends_with("/>") && !is_void(tag) {
            depth += 1;
        }
    }

    let text = rest[start..].trim();
    (!text.is_empty()).then(|| decode_entities(text))
}

fn is_void(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('<')
        .split(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    VOID_ELEMENTS.contains(&name.as_str())
}

/// Value of a query parameter, decoded.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let (_, query) = without_fragment.split_once('?')?;

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Value of the first `<input>` with the given `name`, in any attribute order.
fn input_value(html: &str, name: &str) -> Option<String> {
    INPUT_TAG.find_iter(html).find_map(|tag| {
        let mut matched = false;
        let mut value = None;

        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let attr = caps[1].to_ascii_lowercase();
            let text = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str());
            match attr.as_str() {
                "name" => matched = text == Some(name),
                "value" => value = text,
                _ => {}
            }
        }

        if matched {
            value.filter(|v| !v.is_empty()).map(decode_entities)
        } else {
            None
        }
    })
}

/// Decode the HTML entities that show up in attribute values.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };

            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
