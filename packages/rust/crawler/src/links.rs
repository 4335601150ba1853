//! Candidate startup links from a portfolio page.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use startupscout_shared::OwnDomainRule;
use startupscout_shared::urls::{
    extract_domain, is_asset_url, is_blacklisted_domain, is_valid_url, normalize,
};

/// Every absolute `http(s)` href in `html`, deduplicated, in first-seen order.
///
/// Relative links are ignored. This is a regex scan, not a DOM walk.
pub fn extract_links(html: &str) -> Vec<String> {
    static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)href=["'](https?://[^"']+)["']"#).expect("valid href regex")
    });

    let mut seen = HashSet::new();
    HREF_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Normalize `links` and keep the ones that plausibly point at a startup
/// homepage.
///
/// Drops invalid, blacklisted, asset, repeated, and own-domain links. An
/// empty `accelerator_domain` never matches. Order is preserved.
pub fn filter_candidate_links(
    links: &[String],
    accelerator_domain: &str,
    rule: OwnDomainRule,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for link in links {
        let normalized = normalize(link);
        if normalized.is_empty() || seen.contains(&normalized) {
            continue;
        }
        if is_own_domain(&normalized, accelerator_domain, rule)
            || is_blacklisted_domain(&normalized)
            || !is_valid_url(&normalized)
            || is_asset_url(&normalized)
        {
            continue;
        }
        seen.insert(normalized.clone());
        candidates.push(normalized);
    }

    candidates
}

fn is_own_domain(url: &str, accelerator_domain: &str, rule: OwnDomainRule) -> bool {
    if accelerator_domain.is_empty() {
        return false;
    }
    let domain = extract_domain(url);
    match rule {
        OwnDomainRule::Exact => domain == accelerator_domain,
        OwnDomainRule::Contains => domain.contains(accelerator_domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTFOLIO: &str = r#"
        <a href="https://acme.io/">Acme</a>
        <a href='http://www.Beta.co?ref=accel'>Beta</a>
        <a href="/about">About us</a>
        <a href="https://fonts.gstatic.com/s/inter.woff2">font</a>
        <a href="https://www.linkedin.com/company/accel">LinkedIn</a>
        <a href="https://accel.vc/team">Team</a>
        <a href="https://blog.accel.vc/news">Blog</a>
        <a href="https://acme.io/">Acme again</a>
        <a href="https://ACME.io">Acme shouting</a>
    "#;

    #[test]
    fn extracts_absolute_links_once() {
        let links = extract_links(PORTFOLIO);
        assert_eq!(links[0], "https://acme.io/");
        assert_eq!(links[1], "http://www.Beta.co?ref=accel");
        assert!(!links.iter().any(|l| l == "/about"));
        assert_eq!(links.iter().filter(|l| *l == "https://acme.io/").count(), 1);
    }

    #[test]
    fn filters_to_candidates_exact_rule() {
        let links = extract_links(PORTFOLIO);
        let candidates = filter_candidate_links(&links, "accel.vc", OwnDomainRule::Exact);
        assert_eq!(
            candidates,
            ["https://acme.io", "https://beta.co", "https://blog.accel.vc/news"]
        );
    }

    #[test]
    fn contains_rule_drops_subdomains() {
        let links = extract_links(PORTFOLIO);
        let candidates = filter_candidate_links(&links, "accel.vc", OwnDomainRule::Contains);
        assert_eq!(candidates, ["https://acme.io", "https://beta.co"]);
    }

    #[test]
    fn empty_accelerator_domain_never_matches() {
        let links = vec!["https://acme.io".to_string()];
        let candidates = filter_candidate_links(&links, "", OwnDomainRule::Contains);
        assert_eq!(candidates, ["https://acme.io"]);
    }

    #[test]
    fn no_candidate_is_invalid_asset_or_blacklisted() {
        let links = extract_links(PORTFOLIO);
        for url in filter_candidate_links(&links, "accel.vc", OwnDomainRule::Exact) {
            assert!(is_valid_url(&url));
            assert!(!is_asset_url(&url));
            assert!(!is_blacklisted_domain(&url));
            assert_eq!(normalize(&url), url);
        }
    }
}
