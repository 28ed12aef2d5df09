//! Body cleanup before a message is shown to the classifier.

use std::sync::LazyLock;

use regex::Regex;

/// Marker appended to a truncated body.
pub const TRUNCATION_MARKER: &str = "\n[Content Truncated...]";

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex must compile"));

#[allow(clippy::expect_used)]
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)(view in browser|unsubscribe|privacy policy|manage preferences|click here|trouble viewing).*$",
    )
    .expect("boilerplate regex must compile")
});

#[allow(clippy::expect_used)]
static SIGN_OFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(cheers|best regards|sent from my|disclaimer).*$")
        .expect("sign-off regex must compile")
});

#[allow(clippy::expect_used)]
static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex must compile"));

/// Converts an HTML body to text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "html conversion failed, stripping tags");
        TAGS.replace_all(html, "\n").into_owned()
    })
}

/// Cleans a plain-text body and truncates it to `limit` characters.
///
/// Quoted lines, URLs, newsletter boilerplate and sign-offs are removed and
/// blank-line runs collapse to a single newline.
#[must_use]
pub fn clean_body(body: &str, limit: usize) -> String {
    let unquoted: Vec<&str> = body
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect();
    let text = unquoted.join("\n");

    let text = URL.replace_all(&text, "");
    let text = BOILERPLATE.replace_all(&text, "");
    let text = SIGN_OFF.replace_all(&text, "");

    let collapsed: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();
    let text = collapsed.join("\n");

    truncate(&text, limit)
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}
