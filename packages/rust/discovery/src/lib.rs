//! Portfolio page discovery for accelerator websites.
//!
//! Before extracting startups, StartupScout has to find the page on an
//! accelerator's site that lists its funded companies. Known accelerators
//! are answered from an override table; everything else is probed at a few
//! conventional paths, then the homepage is searched for a likely link.
//! Every network failure is treated as "not here" and logged at debug.

use std::sync::LazyLock;

use regex::Regex;
use startupscout_crawler::PageFetcher;
use startupscout_shared::{PortfolioOverride, Result, ScoutError};
use tracing::{debug, info, instrument};
use url::Url;

/// Accelerators whose portfolio page is known up front.
const BUILTIN_OVERRIDES: &[(&str, &str)] = &[("seedcamp.com", "https://seedcamp.com/companies/")];

/// Conventional portfolio paths, probed in order.
const PROBE_PATHS: &[&str] = &[
    "/portfolio",
    "/companies",
    "/startups",
    "/portfolio-companies",
    "/our-companies",
];

// ---------------------------------------------------------------------------
// LocateResult
// ---------------------------------------------------------------------------

/// How a portfolio page was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatedBy {
    Override,
    Probe,
    HomepageLink,
}

/// Outcome of portfolio discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateResult {
    Found { url: String, via: LocatedBy },
    /// Nothing matched; the caller counts one error for the accelerator.
    NotFound,
}

impl LocateResult {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Found { url, .. } => Some(url),
            Self::NotFound => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Locate the portfolio page of the accelerator at `accelerator_url`.
///
/// Configured `overrides` are consulted before the built-in table.
#[instrument(skip_all, fields(accelerator = %accelerator_name, url = %accelerator_url))]
pub async fn locate(
    fetcher: &dyn PageFetcher,
    accelerator_url: &str,
    accelerator_name: &str,
    overrides: &[PortfolioOverride],
) -> LocateResult {
    if let Some(url) = find_override(accelerator_url, overrides) {
        info!(%url, "portfolio from override");
        return LocateResult::Found {
            url,
            via: LocatedBy::Override,
        };
    }

    let base = accelerator_url.trim().trim_end_matches('/');

    for path in PROBE_PATHS {
        let candidate = format!("{base}{path}");
        match fetcher.fetch(&candidate).await {
            Ok(resp) if resp.is_success() => {
                info!(url = %candidate, "portfolio found by probe");
                return LocateResult::Found {
                    url: candidate,
                    via: LocatedBy::Probe,
                };
            }
            Ok(resp) => debug!(url = %candidate, status = resp.status, "probe miss"),
            Err(e) => debug!(url = %candidate, error = %e, "probe failed"),
        }
    }

    let homepage = match fetcher.fetch(base).await {
        Ok(resp) if resp.is_success() => resp.body,
        Ok(resp) => {
            debug!(status = resp.status, "homepage returned non-2xx");
            return LocateResult::NotFound;
        }
        Err(e) => {
            debug!(error = %e, "homepage fetch failed");
            return LocateResult::NotFound;
        }
    };

    let Some(href) = find_portfolio_href(&homepage) else {
        debug!("no portfolio-like link on homepage");
        return LocateResult::NotFound;
    };

    match resolve_href(base, &href) {
        Ok(url) => {
            info!(%url, "portfolio found via homepage link");
            LocateResult::Found {
                url,
                via: LocatedBy::HomepageLink,
            }
        }
        Err(e) => {
            debug!(%href, error = %e, "could not resolve homepage link");
            LocateResult::NotFound
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_override(accelerator_url: &str, overrides: &[PortfolioOverride]) -> Option<String> {
    let accelerator_url = accelerator_url.to_lowercase();
    let configured = overrides
        .iter()
        .map(|o| (o.domain.as_str(), o.url.as_str()));
    let builtin = BUILTIN_OVERRIDES.iter().copied();

    configured
        .chain(builtin)
        .find(|(domain, _)| {
            let domain = domain.trim().to_lowercase();
            !domain.is_empty() && accelerator_url.contains(&domain)
        })
        .map(|(_, url)| url.to_string())
}

/// First href mentioning `portfolio`, then `companies`, then `startups`.
fn find_portfolio_href(html: &str) -> Option<String> {
    static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        ["portfolio", "companies", "startups"]
            .iter()
            .map(|word| {
                Regex::new(&format!(r#"(?i)href=["']([^"']*{word}[^"']*)["']"#))
                    .expect("valid portfolio link regex")
            })
            .collect()
    });

    PATTERNS.iter().find_map(|re| {
        re.captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Make a homepage href absolute.
///
/// Absolute hrefs are returned as-is, path-only hrefs are anchored to the
/// homepage origin, anything else is joined onto the homepage URL.
fn resolve_href(homepage: &str, href: &str) -> Result<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }

    let base = Url::parse(homepage)
        .map_err(|e| ScoutError::validation(format!("invalid homepage URL {homepage}: {e}")))?;

    if href.starts_with('/') && !href.starts_with("//") {
        return Ok(format!("{}{href}", origin_url(&base)?));
    }

    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| ScoutError::validation(format!("cannot resolve {href}: {e}")))
}

/// Extract the origin (scheme + host + port) from a URL.
fn origin_url(url: &Url) -> Result<String> {
    let scheme = url.scheme();
    let host = url
        .host_str()
        .ok_or_else(|| ScoutError::validation(format!("URL has no host: {url}")))?;

    match url.port() {
        Some(port) => Ok(format!("{scheme}://{host}:{port}")),
        None => Ok(format!("{scheme}://{host}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use startupscout_crawler::HttpFetcher;
    use startupscout_shared::HttpConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig {
            timeout_ms: 2_000,
            ..HttpConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_origin_url_with_port() {
        let url = Url::parse("http://localhost:3000/docs").unwrap();
        assert_eq!(origin_url(&url).unwrap(), "http://localhost:3000");
    }

    #[test]
    fn test_resolve_href_variants() {
        let home = "https://accel.vc/en";
        assert_eq!(
            resolve_href(home, "https://other.vc/portfolio").unwrap(),
            "https://other.vc/portfolio"
        );
        assert_eq!(
            resolve_href(home, "/our-portfolio").unwrap(),
            "https://accel.vc/our-portfolio"
        );
        assert_eq!(
            resolve_href(home, "//cdn.accel.vc/companies").unwrap(),
            "https://cdn.accel.vc/companies"
        );
        assert_eq!(
            resolve_href("https://accel.vc/en/", "portfolio.html").unwrap(),
            "https://accel.vc/en/portfolio.html"
        );
    }

    #[test]
    fn test_portfolio_href_priority() {
        let html = r#"<a href="/startups">S</a><a HREF='/Our-Portfolio'>P</a>"#;
        assert_eq!(find_portfolio_href(html).as_deref(), Some("/Our-Portfolio"));
        assert_eq!(find_portfolio_href("<a href='/about'>x</a>"), None);
    }

    #[tokio::test]
    async fn test_builtin_override_skips_network() {
        // no server: any fetch would fail
        let result = locate(&fetcher(), "https://www.seedcamp.com", "Seedcamp", &[]).await;
        assert_eq!(
            result,
            LocateResult::Found {
                url: "https://seedcamp.com/companies/".into(),
                via: LocatedBy::Override,
            }
        );
    }

    #[test]
    fn test_override_match_ignores_case() {
        assert_eq!(
            find_override("https://SeedCamp.com", &[]).as_deref(),
            Some("https://seedcamp.com/companies/")
        );
        let overrides = vec![PortfolioOverride {
            domain: "Accel.VC".into(),
            url: "https://accel.vc/fund-i".into(),
        }];
        assert_eq!(
            find_override("https://www.accel.vc", &overrides).as_deref(),
            Some("https://accel.vc/fund-i")
        );
        assert_eq!(find_override("https://other.vc", &overrides), None);
    }

    #[tokio::test]
    async fn test_configured_override() {
        let overrides = vec![PortfolioOverride {
            domain: "accel.vc".into(),
            url: "https://accel.vc/fund-i".into(),
        }];
        let result = locate(&fetcher(), "https://accel.vc", "Accel", &overrides).await;
        assert_eq!(result.url(), Some("https://accel.vc/fund-i"));
    }

    #[tokio::test]
    async fn test_probe_finds_second_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_string("list"))
            .mount(&server)
            .await;
        // everything else is a wiremock 404

        let base = format!("{}/", server.uri());
        let result = locate(&fetcher(), &base, "Accel", &[]).await;
        assert_eq!(
            result,
            LocateResult::Found {
                url: format!("{}/companies", server.uri()),
                via: LocatedBy::Probe,
            }
        );
    }

    #[tokio::test]
    async fn test_homepage_link_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<nav><a href="/about">About</a><a href="/fund/portfolio-2024">Portfolio</a></nav>"#,
            ))
            .mount(&server)
            .await;

        let result = locate(&fetcher(), &server.uri(), "Accel", &[]).await;
        assert_eq!(
            result,
            LocateResult::Found {
                url: format!("{}/fund/portfolio-2024", server.uri()),
                via: LocatedBy::HomepageLink,
            }
        );
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
            .mount(&server)
            .await;

        let result = locate(&fetcher(), &server.uri(), "Accel", &[]).await;
        assert_eq!(result, LocateResult::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_site_is_not_found() {
        let result = locate(&fetcher(), "http://127.0.0.1:9", "Gone", &[]).await;
        assert_eq!(result, LocateResult::NotFound);
    }
}
