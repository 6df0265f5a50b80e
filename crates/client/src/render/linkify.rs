//! Auto-linking of bare URLs in rendered markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>\x22]+").expect("invalid url regex"));

/// An unterminated character reference at the end of a string, such as `&amp`.
static ENTITY_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#?[A-Za-z0-9]+$").expect("invalid entity regex"));

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '\''];

/// Wrap bare URLs in text segments with anchors.
///
/// Tags are copied verbatim and text already inside an `<a>` element is left
/// alone. Input text is expected to be HTML-escaped already, so the matched
/// URL is reused as-is for both the `href` and the link text.
pub fn linkify(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut anchor_depth = 0usize;
    let mut cursor = 0;

    for tag in TAG.find_iter(markup) {
        push_text(&mut out, &markup[cursor..tag.start()], anchor_depth > 0);

        let name = tag_name(tag.as_str());
        if name.eq_ignore_ascii_case("a") {
            anchor_depth += 1;
        } else if name.eq_ignore_ascii_case("/a") {
            anchor_depth = anchor_depth.saturating_sub(1);
        }

        out.push_str(tag.as_str());
        cursor = tag.end();
    }
    push_text(&mut out, &markup[cursor..], anchor_depth > 0);

    out
}

fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    inner
        .split(|c: char| c.is_whitespace() || c == '>')
        .next()
        .unwrap_or_default()
}

fn push_text(out: &mut String, text: &str, inside_anchor: bool) {
    if inside_anchor {
        out.push_str(text);
        return;
    }

    let linked = BARE_URL.replace_all(text, |caps: &Captures<'_>| {
        let matched = &caps[0];
        let mut url = matched.trim_end_matches(TRAILING_PUNCTUATION);
        // a `;` closing an escaped entity belongs to the URL
        if matched[url.len()..].starts_with(';') && ENTITY_TAIL.is_match(url) {
            url = &matched[..=url.len()];
        }
        let trailing = &matched[url.len()..];
        let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        format!("<a href=\"{href}\">{url}</a>{trailing}")
    });
    out.push_str(&linked);
}
