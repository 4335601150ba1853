//! URL canonicalization and candidate heuristics.
//!
//! All functions here are string-based and never fail: malformed input
//! yields an empty string or `false`.

use std::sync::LazyLock;

use regex::Regex;

/// Domain fragments that never identify a startup homepage.
const BLACKLISTED_DOMAINS: &[&str] = &[
    "google",
    "facebook",
    "linkedin",
    "twitter",
    "instagram",
    "youtube",
    "vimeo",
    "github",
    "apple",
    "microsoft",
    "amazon",
    "cloudflare",
    "typeform",
    "brandfolder",
    "website-files",
    "maps.google",
    "googleapis",
    "cdn",
    "pr.co",
    "wix",
    "wordpress",
];

/// File endings rejected by [`is_blacklisted_domain`].
const FORBIDDEN_ENDINGS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".pdf", ".ico",
];

/// Static-asset extensions, matched anywhere in the URL.
const ASSET_EXTENSIONS: &[&str] = &[
    // fonts
    ".woff", ".woff2", ".ttf", ".otf", ".eot",
    // styles and scripts
    ".css", ".scss", ".sass", ".js",
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico",
    // video
    ".mp4", ".webm", ".mov",
    // documents and archives
    ".pdf", ".zip", ".tar", ".gz",
];

/// CDN and font hosts.
const ASSET_HOSTS: &[&str] = &[
    "fonts.gstatic.com",
    "fonts.googleapis.com",
    "cdnjs.cloudflare.com",
    "cdn.jsdelivr.net",
    "unpkg.com",
    "assets.ctfassets.net",
    "cloudinary.com",
    "imgix.net",
    "fastly.net",
    "akamaized.net",
    "cloudfront.net",
    "kit.fontawesome.com",
];

/// Path segments that mark bundled assets.
const ASSET_SEGMENTS: &[&str] = &["/asset/", "/assets/", "/static/", "/dist/", "/public/"];

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Canonicalize a URL so that equivalent spellings compare equal.
///
/// Lower-cases, forces `https://`, strips a leading `www.`, drops query and
/// fragment, and removes trailing slashes. Blank input yields `""`.
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lower = trimmed.to_lowercase();
    let rest = if let Some(r) = lower.strip_prefix("https://") {
        r
    } else if let Some(r) = lower.strip_prefix("http://") {
        r
    } else {
        lower.as_str()
    };

    let mut rest = rest;
    while let Some(r) = rest.strip_prefix("www.") {
        rest = r;
    }

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let rest = rest[..end].trim_end_matches(|c: char| c == '/' || c.is_whitespace());

    format!("https://{rest}")
}

/// Host portion of a URL with `www.` removed, or `""` when the input has no
/// `http(s)://` scheme.
pub fn extract_domain(url: &str) -> String {
    static DOMAIN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"https?://([^/]+)").expect("valid domain regex"));

    DOMAIN_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| {
            let host = m.as_str();
            host.strip_prefix("www.").unwrap_or(host).to_string()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// Shape check: optional scheme, one or more dotted labels, alphabetic TLD.
pub fn is_valid_url(url: &str) -> bool {
    static VALID_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^(https?://)?(([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}")
            .expect("valid url regex")
    });

    !url.is_empty() && VALID_RE.is_match(url)
}

/// Social networks, big-tech hosts, site builders, and direct file links.
pub fn is_blacklisted_domain(url: &str) -> bool {
    let domain = extract_domain(url);
    let lower = url.to_lowercase();

    FORBIDDEN_ENDINGS.iter().any(|ext| lower.ends_with(ext))
        || BLACKLISTED_DOMAINS.iter().any(|b| domain.contains(b))
}

/// Fonts, styles, scripts, media, CDN hosts, and bundled-asset paths.
pub fn is_asset_url(url: &str) -> bool {
    let lower = url.to_lowercase();

    ASSET_EXTENSIONS.iter().any(|ext| lower.contains(ext))
        || ASSET_HOSTS.iter().any(|host| lower.contains(host))
        || ASSET_SEGMENTS.iter().any(|seg| lower.contains(seg))
}
