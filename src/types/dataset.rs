//! Defines the static description of a remote NYISO dataset: where it lives,
//! how its archive names are built, how often it is published and how its raw
//! columns map onto the canonical schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Suffix appended to most archive names (`20240101pal_csv.zip`).
pub const DEFAULT_ARCHIVE_SUFFIX: &str = "_csv.zip";

/// The calendar unit covered by one remote archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One archive per calendar day.
    Daily,
    /// One archive per calendar month, always anchored at the first of the month.
    Monthly,
}

impl Granularity {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the archive file name for a period is assembled.
///
/// Every rule produces `{YYYYMMDD}{path_segment}{suffix}`; datasets only differ in
/// the suffix. Datasets that do not follow the default naming must say so
/// explicitly with [`UrlRule::Suffix`] rather than relying on a guess.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum UrlRule {
    /// `{YYYYMMDD}{segment}_csv.zip`
    #[default]
    Default,
    /// `{YYYYMMDD}{segment}{suffix}`, e.g. `_zone_csv.zip` for zonal LMP archives.
    Suffix(String),
}

impl UrlRule {
    pub fn suffix(&self) -> &str {
        match self {
            UrlRule::Default => DEFAULT_ARCHIVE_SUFFIX,
            UrlRule::Suffix(suffix) => suffix,
        }
    }
}

/// Immutable description of one known dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Short identifier used by callers and in cache file names (e.g. `load_actual`).
    pub id: String,
    /// Directory segment on the remote server (e.g. `pal`).
    pub remote_path_segment: String,
    #[serde(default)]
    pub url_rule: UrlRule,
    /// Raw column name → canonical column name.
    pub column_rename_map: BTreeMap<String, String>,
    pub granularity: Granularity,
}

impl DatasetDescriptor {
    pub fn new(
        id: &str,
        remote_path_segment: &str,
        url_rule: UrlRule,
        granularity: Granularity,
        renames: &[(&str, &str)],
    ) -> Self {
        Self {
            id: id.to_string(),
            remote_path_segment: remote_path_segment.to_string(),
            url_rule,
            column_rename_map: renames
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect(),
            granularity,
        }
    }

    /// Canonical names this dataset is expected to produce, in rename-map order.
    pub fn canonical_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::with_capacity(self.column_rename_map.len());
        for canonical in self.column_rename_map.values() {
            if !columns.contains(&canonical.as_str()) {
                columns.push(canonical);
            }
        }
        columns
    }
}
