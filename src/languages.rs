//! Resolution of the judge's language list into the catalog the execution
//! backend can actually run.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::types::LanguageOption;

/// Judge language ids the execution backend accepts, with the key it
/// expects in run and submit requests.
pub const SUPPORTED_JUDGE_IDS: &[(u32, &str)] = &[
    (71, "python"),     // Python 3.8.1
    (62, "java"),       // OpenJDK 13.0.1
    (54, "cpp"),        // GCC 9.2.0
    (50, "c"),          // GCC 9.2.0
    (63, "javascript"), // Node.js 12.14.0
    (74, "typescript"), // 3.7.4
    (60, "go"),         // 1.13.5
    (73, "rust"),       // 1.40.0
    (72, "ruby"),       // 2.7.0
    (68, "php"),        // 7.4.1
    (83, "swift"),      // 5.2.3
    (78, "kotlin"),     // 1.3.70
    (81, "scala"),      // 2.13.2
    (51, "csharp"),     // Mono 6.6.0.161
];

static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("version suffix pattern is valid"));

pub fn canonical_key(judge_id: u32) -> Option<&'static str> {
    SUPPORTED_JUDGE_IDS
        .iter()
        .find(|(id, _)| *id == judge_id)
        .map(|(_, key)| *key)
}

/// `"Python (3.8.1)"` becomes `"Python"`.
pub fn display_name(raw_name: &str) -> String {
    VERSION_SUFFIX.replace(raw_name, "").trim().to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageCatalog {
    entries: Vec<LanguageOption>,
}

impl LanguageCatalog {
    /// Builds the catalog from raw judge entries (`{id, name}`). Entries the
    /// backend cannot run are dropped and the first entry per canonical key
    /// wins.
    pub fn resolve(raw: &[Value]) -> Self {
        let mut entries: Vec<LanguageOption> = Vec::new();

        for entry in raw {
            let Some(judge_id) = entry.get("id").and_then(judge_id) else {
                continue;
            };
            let Some(key) = canonical_key(judge_id) else {
                tracing::debug!(judge_id, "dropping unsupported language");
                continue;
            };
            if entries.iter().any(|existing| existing.key == key) {
                continue;
            }

            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map(display_name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| key.to_string());

            entries.push(LanguageOption {
                judge_id,
                key: key.to_string(),
                name,
            });
        }

        Self { entries }
    }

    /// Picks the first preferred key present, else the first entry.
    pub fn default_key<S: AsRef<str>>(&self, preferences: &[S]) -> Option<&str> {
        preferences
            .iter()
            .find_map(|preferred| self.get(preferred.as_ref()))
            .or_else(|| self.entries.first())
            .map(|option| option.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&LanguageOption> {
        self.entries.iter().find(|option| option.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageOption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn judge_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
