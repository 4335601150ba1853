//! Display-name derivation for discovered startups.
//!
//! Prefer a cleaned homepage `<title>`; fall back to the domain when the
//! title looks like marketing copy or a generic page name.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::fetch::PageFetcher;

/// Title separators, checked in order; only the first present one applies.
const TITLE_SEPARATORS: &[&str] = &["|", " - ", " – ", " — ", ":", "•"];

/// Name used when nothing usable remains of the domain.
const UNKNOWN_NAME: &str = "Unknown";

/// Short prefixes dropped from domain labels (`getrevox` -> `revox`).
const DOMAIN_PREFIXES: &[&str] = &["get", "use", "try", "my"];

/// Fetch the homepage and derive a name.
///
/// `None` when the fetch fails or the status is not 2xx; the caller counts
/// it as an error.
pub async fn derive_display_name(fetcher: &dyn PageFetcher, url: &str) -> Option<String> {
    match fetcher.fetch(url).await {
        Ok(resp) if resp.is_success() => Some(name_from_html(&resp.body, url)),
        Ok(resp) => {
            debug!(%url, status = resp.status, "homepage returned non-2xx");
            None
        }
        Err(e) => {
            debug!(%url, error = %e, "homepage fetch failed");
            None
        }
    }
}

/// Name from already-fetched homepage markup.
pub fn name_from_html(html: &str, url: &str) -> String {
    let title = extract_title(html).map(|t| clean_title(&t)).unwrap_or_default();
    if is_rejected_title(&title) {
        format_name_from_domain(url)
    } else {
        title
    }
}

/// Raw `<title>` text, trimmed.
pub fn extract_title(html: &str) -> Option<String> {
    static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("valid title regex")
    });

    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Decode common entities and cut at the first separator.
pub fn clean_title(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw
        .replace("&#8211;", "-")
        .replace("&amp;", "&")
        .replace("&nbsp;", " ");

    let head = TITLE_SEPARATORS
        .iter()
        .find(|sep| text.contains(**sep))
        .and_then(|sep| text.split(*sep).next())
        .unwrap_or(&text);

    head.trim().to_string()
}

/// Whether a cleaned title is unusable as a company name.
pub fn is_rejected_title(title: &str) -> bool {
    static BUZZWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)powered|solution|platform|software|tool|app|best|leading|world|network|review")
            .expect("valid buzzword regex")
    });

    title.is_empty()
        || BUZZWORD_RE.is_match(title)
        || title.split_whitespace().count() > 3
        || title.contains('.')
        || title == "Home"
        || title == "Welcome"
}

/// Company name from the first domain label, e.g. `https://getrevox.com` -> `Revox`.
pub fn format_name_from_domain(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("app.").unwrap_or(rest);

    let host = rest.split('/').next().unwrap_or_default();
    let label = host.split('.').next().unwrap_or_default();
    let label = strip_domain_prefix(label);

    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => UNKNOWN_NAME.to_string(),
    }
}

/// Drop a leading `get|use|try|my` when at least three letters follow it.
fn strip_domain_prefix(label: &str) -> &str {
    for prefix in DOMAIN_PREFIXES {
        let Some(head) = label.get(..prefix.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(prefix) {
            let rest = &label[prefix.len()..];
            if rest.chars().take(3).filter(|c| c.is_ascii_alphabetic()).count() == 3 {
                return rest;
            }
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use async_trait::async_trait;
    use startupscout_shared::{Result, ScoutError};

    #[test]
    fn extracts_and_cleans_title() {
        let html = "<html><head><TITLE data-x=1> Acme | Payments for robots </TITLE></head></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Acme | Payments for robots"));
        assert_eq!(name_from_html(html, "https://acme.io"), "Acme");
    }

    #[test]
    fn clean_title_decodes_and_splits() {
        assert_eq!(clean_title("Acme &#8211; Robots"), "Acme");
        assert_eq!(clean_title("Foo &amp; Bar: the company"), "Foo & Bar");
        assert_eq!(clean_title("Zed&nbsp;Labs • Home"), "Zed Labs");
        assert_eq!(clean_title("Acme – Home of Widgets"), "Acme");
        assert_eq!(clean_title("Zed Labs — Robots for farms"), "Zed Labs");
        assert_eq!(clean_title("Plain"), "Plain");
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn rejects_marketing_titles() {
        assert!(is_rejected_title(""));
        assert!(is_rejected_title("The Leading Robots Company"));
        assert!(is_rejected_title("AI Platform"));
        assert!(is_rejected_title("One Two Three Four"));
        assert!(is_rejected_title("acme.io"));
        assert!(is_rejected_title("Home"));
        assert!(is_rejected_title("Welcome"));
        assert!(!is_rejected_title("Acme Robotics"));
    }

    #[test]
    fn rejected_title_falls_back_to_domain() {
        let html = "<title>Home</title>";
        assert_eq!(name_from_html(html, "https://www.getrevox.com/about"), "Revox");
        assert_eq!(name_from_html("<p>no title</p>", "https://acme.io"), "Acme");
    }

    #[test]
    fn domain_formatting() {
        assert_eq!(format_name_from_domain("https://getrevox.com"), "Revox");
        assert_eq!(format_name_from_domain("https://app.tryfoo.io/login"), "Foo");
        assert_eq!(format_name_from_domain("https://myco.com"), "Myco");
        assert_eq!(format_name_from_domain("https://user.dev"), "User");
        assert_eq!(format_name_from_domain("https://mymind.com"), "Mind");
        assert_eq!(format_name_from_domain("acme.io"), "Acme");
    }

    struct StaticFetcher(Result<FetchResponse>);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchResponse> {
            match &self.0 {
                Ok(r) => Ok(r.clone()),
                Err(_) => Err(ScoutError::Network("connection refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn derive_name_none_on_failure() {
        let down = StaticFetcher(Err(ScoutError::Network("x".into())));
        assert_eq!(derive_display_name(&down, "https://acme.io").await, None);

        let gone = StaticFetcher(Ok(FetchResponse {
            status: 410,
            body: String::new(),
        }));
        assert_eq!(derive_display_name(&gone, "https://acme.io").await, None);

        let ok = StaticFetcher(Ok(FetchResponse {
            status: 200,
            body: "<title>Acme Robotics - Home</title>".into(),
        }));
        assert_eq!(
            derive_display_name(&ok, "https://acme.io").await.as_deref(),
            Some("Acme Robotics")
        );
    }
}
