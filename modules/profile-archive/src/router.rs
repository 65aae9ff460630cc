// Platform routing: URL → hosting family, determined from the URL string alone (no HTTP).

use profile_common::PlatformTag;

/// One host family. Matches when the URL host equals a domain or is a subdomain of it.
#[derive(Debug, Clone)]
pub struct HostRule {
    pub domains: Vec<String>,
    /// Checked in order against the lowercased path; first hit wins.
    pub path_rules: Vec<(String, PlatformTag)>,
    pub default: PlatformTag,
}

impl HostRule {
    fn new(domains: &[&str], default: PlatformTag) -> Self {
        Self {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            path_rules: Vec::new(),
            default,
        }
    }

    fn with_path(mut self, fragment: &str, tag: PlatformTag) -> Self {
        self.path_rules.push((fragment.to_string(), tag));
        self
    }

    fn matches_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| {
            host == d.as_str()
                || host
                    .strip_suffix(d.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    fn tag_for_path(&self, path: &str) -> PlatformTag {
        self.path_rules
            .iter()
            .find(|(fragment, _)| path.contains(fragment.as_str()))
            .map(|(_, tag)| *tag)
            .unwrap_or(self.default)
    }
}

/// Host rule table plus the set of platforms that need a rendering browser.
/// Immutable once built; passed to the classifier at construction.
#[derive(Debug, Clone)]
pub struct PlatformRules {
    pub hosts: Vec<HostRule>,
    pub render_platforms: Vec<PlatformTag>,
}

impl PlatformRules {
    pub fn standard() -> Self {
        use PlatformTag::*;
        Self {
            hosts: vec![
                HostRule::new(&["bit.ly", "tinyurl.com", "t.co", "goo.gl"], Shortener),
                HostRule::new(&["docs.google.com"], GoogleDocsOther)
                    .with_path("/document/", GoogleDocs)
                    .with_path("/presentation/", GoogleSlides),
                HostRule::new(&["drive.google.com"], GoogleDriveFile),
                HostRule::new(&["notion.so", "notion.site"], Notion),
                HostRule::new(&["paper.dropbox.com"], DropboxPaper),
                HostRule::new(&["dropbox.com"], DropboxFile).with_path("/paper/", DropboxPaper),
                HostRule::new(&["proton.me"], ProtonDrive),
                HostRule::new(&["yandex.com", "yandex.ru"], YandexDisk),
                HostRule::new(&["coda.io"], Coda),
                HostRule::new(&["carrd.co"], Carrd),
                HostRule::new(&["twitter.com", "x.com"], Twitter),
                HostRule::new(&["youtube.com", "youtu.be"], Youtube),
            ],
            render_platforms: vec![Notion],
        }
    }

    pub fn with_render_platforms(mut self, platforms: Vec<PlatformTag>) -> Self {
        self.render_platforms = platforms;
        self
    }
}

impl Default for PlatformRules {
    fn default() -> Self {
        Self::standard()
    }
}

pub struct PlatformClassifier {
    rules: PlatformRules,
}

impl PlatformClassifier {
    pub fn new(rules: PlatformRules) -> Self {
        Self { rules }
    }

    /// Classify a profile URL. Blank or absent → `missing_url`; unparsable → `custom_site`.
    pub fn classify(&self, url: Option<&str>) -> PlatformTag {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return PlatformTag::MissingUrl;
        };
        let Some((host, path)) = host_and_path(url) else {
            return PlatformTag::CustomSite;
        };
        self.rules
            .hosts
            .iter()
            .find(|rule| rule.matches_host(&host))
            .map(|rule| rule.tag_for_path(&path))
            .unwrap_or(PlatformTag::CustomSite)
    }

    /// Whether this platform only yields content after client-side rendering.
    pub fn needs_render(&self, tag: PlatformTag) -> bool {
        self.rules.render_platforms.contains(&tag)
    }
}

impl Default for PlatformClassifier {
    fn default() -> Self {
        Self::new(PlatformRules::standard())
    }
}

/// Lowercased host and path. Scheme-less input ("bit.ly/abc") is read as https.
fn host_and_path(url: &str) -> Option<(String, String)> {
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            url::Url::parse(&format!("https://{url}")).ok()?
        }
        Err(_) => return None,
    };
    let host = parsed.host_str()?.trim_start_matches("www.").to_lowercase();
    Some((host, parsed.path().to_lowercase()))
}

/// Canonical comparison form of a URL: query and fragment dropped, scheme and
/// host lowercased (scheme defaults to https), trailing slashes removed.
/// Applying it twice gives the same result as applying it once.
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let cut = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let without_query = &trimmed[..cut];

    let (scheme, rest) = match split_scheme(without_query) {
        Some((scheme, rest)) => (scheme.to_lowercase(), rest),
        None => ("https".to_string(), without_query),
    };
    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let path = path.trim_end_matches(|c: char| c == '/' || c.is_whitespace());
    format!("{scheme}://{}{path}", host.trim().to_lowercase())
}

/// `scheme://` prefix per RFC 3986 scheme syntax.
fn split_scheme(url: &str) -> Option<(&str, &str)> {
    let idx = url.find("://")?;
    let scheme = &url[..idx];
    let mut chars = scheme.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (first_ok && rest_ok).then(|| (scheme, &url[idx + 3..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(url: &str) -> PlatformTag {
        PlatformClassifier::default().classify(Some(url))
    }

    #[test]
    fn google_docs_paths() {
        assert_eq!(
            classify("https://docs.google.com/document/d/ABC123/edit"),
            PlatformTag::GoogleDocs
        );
        assert_eq!(
            classify("https://docs.google.com/presentation/d/XYZ/edit"),
            PlatformTag::GoogleSlides
        );
        assert_eq!(
            classify("https://docs.google.com/forms/d/e/123/viewform"),
            PlatformTag::GoogleDocsOther
        );
        assert_eq!(
            classify("https://drive.google.com/file/d/1/view"),
            PlatformTag::GoogleDriveFile
        );
    }

    #[test]
    fn subdomains_match_but_lookalikes_do_not() {
        assert_eq!(classify("https://alice.notion.site/Me-123"), PlatformTag::Notion);
        assert_eq!(classify("https://www.notion.so/xyz"), PlatformTag::Notion);
        assert_eq!(classify("https://notnotion.so/xyz"), PlatformTag::CustomSite);
        assert_eq!(classify("https://alice.carrd.co"), PlatformTag::Carrd);
    }

    #[test]
    fn shorteners_and_socials() {
        assert_eq!(classify("https://bit.ly/abc"), PlatformTag::Shortener);
        assert_eq!(classify("tinyurl.com/abc"), PlatformTag::Shortener);
        assert_eq!(classify("https://t.co/zzz"), PlatformTag::Shortener);
        assert_eq!(classify("https://x.com/someone"), PlatformTag::Twitter);
        assert_eq!(classify("https://youtu.be/abc"), PlatformTag::Youtube);
    }

    #[test]
    fn dropbox_paper_vs_file() {
        assert_eq!(
            classify("https://paper.dropbox.com/doc/Me--abc"),
            PlatformTag::DropboxPaper
        );
        assert_eq!(
            classify("https://www.dropbox.com/scl/fi/abc/me.pdf"),
            PlatformTag::DropboxFile
        );
        assert_eq!(
            classify("https://www.dropbox.com/paper/doc/abc"),
            PlatformTag::DropboxPaper
        );
    }

    #[test]
    fn blank_and_garbage() {
        let classifier = PlatformClassifier::default();
        assert_eq!(classifier.classify(None), PlatformTag::MissingUrl);
        assert_eq!(classifier.classify(Some("   ")), PlatformTag::MissingUrl);
        assert_eq!(classifier.classify(Some("http://")), PlatformTag::CustomSite);
        assert_eq!(
            classifier.classify(Some("https://example.com/about")),
            PlatformTag::CustomSite
        );
    }

    #[test]
    fn render_platforms_are_configurable() {
        let classifier = PlatformClassifier::default();
        assert!(classifier.needs_render(PlatformTag::Notion));
        assert!(!classifier.needs_render(PlatformTag::Coda));

        let classifier = PlatformClassifier::new(
            PlatformRules::standard().with_render_platforms(vec![PlatformTag::Coda]),
        );
        assert!(classifier.needs_render(PlatformTag::Coda));
        assert!(!classifier.needs_render(PlatformTag::Notion));
    }

    #[test]
    fn canonical_strips_query_fragment_and_slash() {
        assert_eq!(
            canonical_url("  HTTPS://Docs.Google.com/document/d/ABC/?usp=sharing#h "),
            "https://docs.google.com/document/d/ABC"
        );
        assert_eq!(canonical_url("bit.ly/abc/"), "https://bit.ly/abc");
        assert_eq!(canonical_url("http://Example.com"), "http://example.com");
        assert_eq!(canonical_url(""), "");
    }

    #[test]
    fn canonical_keeps_path_case() {
        assert_eq!(
            canonical_url("https://www.notion.so/Alice-ABC"),
            "https://www.notion.so/Alice-ABC"
        );
    }

    proptest! {
        #[test]
        fn canonical_is_idempotent(raw in "[ a-zA-Z0-9:/?#.+-]{0,40}") {
            let once = canonical_url(&raw);
            prop_assert_eq!(canonical_url(&once), once);
        }
    }
}
