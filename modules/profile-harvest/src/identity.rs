// Deterministic profile ids derived from directory identity fields.

use std::collections::HashSet;

use profile_common::DirectoryRow;
use sha2::{Digest, Sha256};

/// Ids are `usr_` + 10 hex chars, i.e. 40 bits of digest.
const ID_SPACE: u64 = 1 << 40;

/// Assigns ids for one batch. Identical inputs get identical ids across runs;
/// collisions inside the batch are resolved by stepping the numeric value.
#[derive(Debug, Default)]
pub struct IdentityAssigner {
    seen: HashSet<String>,
}

impl IdentityAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, row: &DirectoryRow) -> String {
        let base = identity_digest(row);
        let mut step = 0u64;
        loop {
            let id = format_id((base + step) % ID_SPACE);
            if self.seen.insert(id.clone()) {
                return id;
            }
            step += 1;
        }
    }
}

/// The string that identifies a row: `url|name|age|gender|interests|location`.
pub fn identity_key(row: &DirectoryRow) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}",
        row.profile_url.as_deref().unwrap_or_default().trim(),
        row.name.trim(),
        row.age.map(|a| a.to_string()).unwrap_or_default(),
        row.gender.trim(),
        row.interested_in.join(" "),
        row.location.trim(),
    )
}

fn identity_digest(row: &DirectoryRow) -> u64 {
    let digest = Sha256::digest(identity_key(row).as_bytes());
    digest[..5]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

fn format_id(value: u64) -> String {
    format!("usr_{value:010x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, url: &str) -> DirectoryRow {
        DirectoryRow {
            name: name.to_string(),
            age: Some(34),
            gender: "woman".to_string(),
            interested_in: vec!["men".to_string(), "women".to_string()],
            location: "Berlin".to_string(),
            profile_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn id_is_prefix_plus_ten_hex() {
        let id = IdentityAssigner::new().assign(&row("Ana", "https://x.example"));
        assert!(id.starts_with("usr_"));
        assert_eq!(id.len(), 14);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn id_matches_sha256_prefix() {
        let r = row("Ana", "https://x.example");
        let expected = hex::encode(Sha256::digest(identity_key(&r).as_bytes()));
        assert_eq!(IdentityAssigner::new().assign(&r), format!("usr_{}", &expected[..10]));
    }

    #[test]
    fn same_rows_same_ids_across_batches() {
        let rows = vec![
            row("Ana", "https://a.example"),
            row("Ben", "https://b.example"),
            row("Cy", "https://c.example"),
        ];
        let first: Vec<_> = {
            let mut assigner = IdentityAssigner::new();
            rows.iter().map(|r| assigner.assign(r)).collect()
        };
        let second: Vec<_> = {
            let mut assigner = IdentityAssigner::new();
            rows.iter().map(|r| assigner.assign(r)).collect()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn collisions_step_to_the_next_value() {
        let r = row("Ana", "https://a.example");
        let mut assigner = IdentityAssigner::new();
        let first = assigner.assign(&r);
        let second = assigner.assign(&r);
        assert_ne!(first, second);

        let first_value = u64::from_str_radix(&first[4..], 16).unwrap();
        let second_value = u64::from_str_radix(&second[4..], 16).unwrap();
        assert_eq!(second_value, (first_value + 1) % ID_SPACE);
    }

    #[test]
    fn key_joins_fields_in_order() {
        assert_eq!(
            identity_key(&row("Ana", "https://a.example")),
            "https://a.example|Ana|34|woman|men women|Berlin"
        );
    }
}
