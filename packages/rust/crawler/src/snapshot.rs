//! Homepage snapshot used to build value-proposition prompts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use startupscout_shared::{Result, ScoutError, SiteSnapshot};

use crate::fetch::PageFetcher;

/// Upper bound on body text carried into a prompt, in characters.
pub const MAX_BODY_CHARS: usize = 2000;

const NO_TITLE: &str = "No Title";
const NO_DESCRIPTION: &str = "No Description";

/// Fetch `url` and summarize it. Non-2xx is an [`ScoutError::Http`].
pub async fn fetch_snapshot(fetcher: &dyn PageFetcher, url: &str) -> Result<SiteSnapshot> {
    let response = fetcher.fetch(url).await?;
    if !response.is_success() {
        return Err(ScoutError::http(url, response.status));
    }
    Ok(snapshot_from_html(&response.body))
}

/// Title, meta description, and a tag-stripped body prefix.
pub fn snapshot_from_html(html: &str) -> SiteSnapshot {
    static TITLE_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
    static META_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("meta[name][content]").expect("valid meta selector"));

    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let meta_description = doc
        .select(&META_SEL)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("description"))
        })
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    SiteSnapshot {
        title,
        meta_description,
        body_text: body_text(html),
    }
}

/// Strip scripts, styles, and tags; collapse whitespace; cap at
/// [`MAX_BODY_CHARS`].
fn body_text(html: &str) -> String {
    static SCRIPT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
    static STYLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = TAG_RE.replace_all(&text, " ");
    let text = WS_RE.replace_all(&text, " ");

    text.trim().chars().take(MAX_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reads_title_and_description() {
        let html = r#"<html><head>
            <title> Acme | Payments </title>
            <meta content="Payments for robots" name="Description">
            <style>body { color: red }</style>
            <script>var tracking = 1;</script>
        </head><body><h1>Acme</h1>
        <p>We   move
        money.</p></body></html>"#;

        let snap = snapshot_from_html(html);
        assert_eq!(snap.title, "Acme | Payments");
        assert_eq!(snap.meta_description, "Payments for robots");
        assert!(snap.body_text.contains("We move money."));
        assert!(!snap.body_text.contains("tracking"));
        assert!(!snap.body_text.contains("color"));
        assert!(!snap.body_text.contains('<'));
    }

    #[test]
    fn snapshot_defaults_when_missing() {
        let snap = snapshot_from_html("<html><body>hello</body></html>");
        assert_eq!(snap.title, "No Title");
        assert_eq!(snap.meta_description, "No Description");
        assert_eq!(snap.body_text, "hello");
    }

    #[test]
    fn body_is_capped_on_char_boundary() {
        let html = format!("<p>{}</p>", "é".repeat(3_000));
        let snap = snapshot_from_html(&html);
        assert_eq!(snap.body_text.chars().count(), MAX_BODY_CHARS);
    }
}
