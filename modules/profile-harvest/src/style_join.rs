// Join a secondary style dataset (no ids of its own) into the store by canonical URL.

use std::collections::HashMap;
use std::fmt;

use profile_archive::canonical_url;
use profile_common::{DatingStyle, ProfileRecord};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRow {
    #[serde(default)]
    pub profile_url: String,
    #[serde(default, alias = "datingStyle")]
    pub style: Option<String>,
}

/// Map a free-text style label to a known style. Unknown labels map to `None`.
pub fn normalize_style(raw: &str) -> Option<DatingStyle> {
    let label = raw
        .to_lowercase()
        .replace(['/', ',', '&', '+'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match label.as_str() {
        "mono" | "monogamous" | "monogamy" => Some(DatingStyle::Mono),
        "poly" | "polyamorous" | "polyamory" => Some(DatingStyle::Poly),
        "any" | "mono poly" | "poly mono" => Some(DatingStyle::Any),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinReport {
    pub matched: usize,
    pub normalized: usize,
    /// Secondary rows whose URL matched no record.
    pub unmatched: Vec<String>,
}

impl fmt::Display for JoinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Style join: {} records matched, {} normalized, {} style rows unmatched",
            self.matched,
            self.normalized,
            self.unmatched.len(),
        )
    }
}

/// Write `datingStyleRaw` and the normalized `datingStyle` onto matching records.
/// A label that does not normalize clears any previous `datingStyle`.
pub fn join_styles(records: &mut [ProfileRecord], rows: &[StyleRow]) -> JoinReport {
    let mut by_url: HashMap<String, &StyleRow> = HashMap::new();
    for row in rows {
        let key = canonical_url(&row.profile_url);
        if !key.is_empty() {
            by_url.insert(key, row);
        }
    }

    let mut report = JoinReport::default();
    let mut used: HashMap<&str, bool> = by_url.keys().map(|k| (k.as_str(), false)).collect();

    for record in records.iter_mut() {
        let key = canonical_url(record.profile_url.as_deref().unwrap_or_default());
        let Some(row) = by_url.get(&key) else {
            continue;
        };
        if let Some(flag) = used.get_mut(key.as_str()) {
            *flag = true;
        }
        report.matched += 1;

        let raw = row.style.clone().unwrap_or_default();
        record.dating_style = normalize_style(&raw);
        if record.dating_style.is_some() {
            report.normalized += 1;
        }
        record.dating_style_raw = Some(raw);
    }

    report.unmatched = rows
        .iter()
        .filter(|row| {
            let key = canonical_url(&row.profile_url);
            key.is_empty() || !used.get(key.as_str()).copied().unwrap_or(false)
        })
        .map(|row| row.profile_url.clone())
        .collect();
    report
}
