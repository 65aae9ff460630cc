use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

// --- Platform ---

/// Hosting family a profile URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformTag {
    GoogleDocs,
    GoogleSlides,
    GoogleDocsOther,
    GoogleDriveFile,
    Notion,
    DropboxFile,
    DropboxPaper,
    Shortener,
    ProtonDrive,
    YandexDisk,
    Coda,
    Carrd,
    Twitter,
    Youtube,
    CustomSite,
    MissingUrl,
}

impl PlatformTag {
    pub const ALL: [PlatformTag; 16] = [
        PlatformTag::GoogleDocs,
        PlatformTag::GoogleSlides,
        PlatformTag::GoogleDocsOther,
        PlatformTag::GoogleDriveFile,
        PlatformTag::Notion,
        PlatformTag::DropboxFile,
        PlatformTag::DropboxPaper,
        PlatformTag::Shortener,
        PlatformTag::ProtonDrive,
        PlatformTag::YandexDisk,
        PlatformTag::Coda,
        PlatformTag::Carrd,
        PlatformTag::Twitter,
        PlatformTag::Youtube,
        PlatformTag::CustomSite,
        PlatformTag::MissingUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformTag::GoogleDocs => "google_docs",
            PlatformTag::GoogleSlides => "google_slides",
            PlatformTag::GoogleDocsOther => "google_docs_other",
            PlatformTag::GoogleDriveFile => "google_drive_file",
            PlatformTag::Notion => "notion",
            PlatformTag::DropboxFile => "dropbox_file",
            PlatformTag::DropboxPaper => "dropbox_paper",
            PlatformTag::Shortener => "shortener",
            PlatformTag::ProtonDrive => "proton_drive",
            PlatformTag::YandexDisk => "yandex_disk",
            PlatformTag::Coda => "coda",
            PlatformTag::Carrd => "carrd",
            PlatformTag::Twitter => "twitter",
            PlatformTag::Youtube => "youtube",
            PlatformTag::CustomSite => "custom_site",
            PlatformTag::MissingUrl => "missing_url",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Review / style ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatingStyle {
    Mono,
    Poly,
    Any,
}

// --- Directory rows ---

/// Identity + URL stub produced by the upstream directory scraper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRow {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default, deserialize_with = "token_set")]
    pub interested_in: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_flexibility: String,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

// --- Profile records ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    #[serde(default)]
    pub full_text: String,
}

/// One canonical, enriched profile. Keyed by `id`, which never changes once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_age", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default, deserialize_with = "token_set")]
    pub interested_in: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_flexibility: String,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_platform", skip_serializing_if = "Option::is_none")]
    pub doc_platform: Option<PlatformTag>,
    #[serde(default)]
    pub profile_details: ProfileDetails,
    #[serde(default)]
    pub scrape_timestamp_detail: Option<DateTime<Utc>>,
    #[serde(default)]
    pub doc_accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dating_style_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dating_style: Option<DatingStyle>,
}

impl ProfileRecord {
    /// Fresh, never-fetched record for a directory row.
    pub fn from_row(id: String, row: DirectoryRow) -> Self {
        Self {
            id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            interested_in: row.interested_in,
            location: row.location,
            location_flexibility: row.location_flexibility,
            profile_url: row.profile_url,
            last_updated: row.last_updated,
            expanded_url: None,
            doc_platform: None,
            profile_details: ProfileDetails::default(),
            scrape_timestamp_detail: None,
            doc_accessible: false,
            review_status: None,
            review_reason: None,
            review_timestamp: None,
            dating_style_raw: None,
            dating_style: None,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.profile_details.full_text
    }

    /// Trimmed profile URL, or `None` when absent or blank.
    pub fn url(&self) -> Option<&str> {
        self.profile_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// The URL that best describes where the content lives: the resolved
    /// shortener target when known, otherwise the directory URL.
    pub fn effective_url(&self) -> Option<&str> {
        self.expanded_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .or_else(|| self.url())
    }

    pub fn is_closed(&self) -> bool {
        self.review_status == Some(ReviewStatus::Closed)
    }
}

// --- Skip ledger ---

/// Why a row produced no accepted content in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingUrl,
    NetworkError,
    HttpStatus,
    ParseError,
    RawWriteError,
    SchemaValidation,
    ExtractionUnsupported,
    AuthRequired,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingUrl => "missing_url",
            SkipReason::NetworkError => "network_error",
            SkipReason::HttpStatus => "http_status",
            SkipReason::ParseError => "parse_error",
            SkipReason::RawWriteError => "raw_write_error",
            SkipReason::SchemaValidation => "schema_validation",
            SkipReason::ExtractionUnsupported => "extraction_unsupported",
            SkipReason::AuthRequired => "auth_required",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub reason: SkipReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkipRecord {
    pub fn new(id: Option<&str>, url: Option<&str>, reason: SkipReason) -> Self {
        Self {
            id: id.map(String::from),
            url: url.map(String::from),
            reason,
            status: None,
            detail: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// --- Serde helpers for upstream data ---

/// `interestedIn` arrives either as a token array or as one space-separated string.
fn token_set<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tokens {
        List(Vec<String>),
        Joined(String),
    }

    let tokens = match Option::<Tokens>::deserialize(deserializer)? {
        Some(Tokens::List(list)) => list,
        Some(Tokens::Joined(s)) => s.split_whitespace().map(String::from).collect(),
        None => Vec::new(),
    };
    Ok(tokens
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Age {
        Number(u32),
        Text(String),
    }

    Ok(match Option::<Age>::deserialize(deserializer)? {
        Some(Age::Number(n)) => Some(n),
        Some(Age::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Unknown tags from older stores are dropped rather than failing the whole load.
fn lenient_platform<'de, D>(deserializer: D) -> Result<Option<PlatformTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let tag = PlatformTag::from_str_opt(&s);
        if tag.is_none() {
            warn!(tag = s.as_str(), "Ignoring unknown docPlatform tag");
        }
        tag
    }))
}
