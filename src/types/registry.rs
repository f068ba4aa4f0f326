//! The process-wide table of known datasets, zones and normalization constants.
//!
//! A [`DatasetRegistry`] is built once (usually with [`DatasetRegistry::nyiso`])
//! and shared read-only with every component through an `Arc`. Tests build their
//! own registries to point the pipeline at fake datasets.

use crate::error::ConfigError;
use crate::types::dataset::{DatasetDescriptor, Granularity, UrlRule};
use serde::{Deserialize, Serialize};

pub const NYISO_BASE_URL: &str = "https://mis.nyiso.com/public/csv";
pub const NYISO_TIMEZONE: &str = "America/New_York";

/// The 11 NYISO load zones.
pub const NYISO_ZONES: [&str; 11] = [
    "CAPITL", "CENTRL", "DUNWOD", "GENESE", "HUD VL", "LONGIL", "MHK VL", "MILLWD", "N.Y.C.",
    "NORTH", "WEST",
];

/// Metric columns checked by [`crate::clean`] when flagging outliers.
pub const DEFAULT_OUTLIER_COLUMNS: [&str; 5] =
    ["lmp_total", "lmp_losses", "lmp_congestion", "load_mw", "gen_mw"];

const LMP_RENAMES: [(&str, &str); 5] = [
    ("Time Stamp", "timestamp"),
    ("Name", "zone"),
    ("LBMP ($/MWHr)", "lmp_total"),
    ("Marginal Cost Losses ($/MWHr)", "lmp_losses"),
    ("Marginal Cost Congestion ($/MWHr)", "lmp_congestion"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRegistry {
    pub datasets: Vec<DatasetDescriptor>,
    pub zones: Vec<String>,
    /// IANA name of the operator's civil timezone.
    pub timezone: String,
    #[serde(default = "default_outlier_columns")]
    pub outlier_columns: Vec<String>,
}

fn default_outlier_columns() -> Vec<String> {
    DEFAULT_OUTLIER_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl DatasetRegistry {
    /// Builds a registry, rejecting duplicate dataset ids.
    pub fn new(
        datasets: Vec<DatasetDescriptor>,
        zones: Vec<String>,
        timezone: &str,
    ) -> Result<Self, ConfigError> {
        let registry = Self {
            datasets,
            zones,
            timezone: timezone.to_string(),
            outlier_columns: default_outlier_columns(),
        };
        registry.validate()?;
        Ok(registry)
    }

    /// The five public NYISO datasets.
    pub fn nyiso() -> Self {
        let datasets = vec![
            DatasetDescriptor::new(
                "load_actual",
                "pal",
                UrlRule::Default,
                Granularity::Monthly,
                &[("Time Stamp", "timestamp"), ("Name", "zone"), ("Load", "load_mw")],
            ),
            DatasetDescriptor::new(
                "load_forecast",
                "isolf",
                UrlRule::Default,
                Granularity::Monthly,
                &[
                    ("Time Stamp", "timestamp"),
                    ("Zone Name", "zone"),
                    ("Load", "load_forecast_mw"),
                ],
            ),
            DatasetDescriptor::new(
                "lmp_dayahead",
                "damlbmp",
                UrlRule::Suffix("_zone_csv.zip".to_string()),
                Granularity::Monthly,
                &LMP_RENAMES,
            ),
            DatasetDescriptor::new(
                "lmp_realtime",
                "realtime",
                UrlRule::Suffix("_zone_csv.zip".to_string()),
                Granularity::Monthly,
                &LMP_RENAMES,
            ),
            DatasetDescriptor::new(
                "fuel_mix",
                "rtfuelmix",
                UrlRule::Default,
                Granularity::Monthly,
                &[
                    ("Time Stamp", "timestamp"),
                    ("Fuel Category", "fuel_type"),
                    ("Gen MW", "gen_mw"),
                ],
            ),
        ];
        Self {
            datasets,
            zones: NYISO_ZONES.iter().map(|z| z.to_string()).collect(),
            timezone: NYISO_TIMEZONE.to_string(),
            outlier_columns: default_outlier_columns(),
        }
    }

    /// Loads a registry from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let registry: Self = serde_json::from_str(json).map_err(ConfigError::RegistryParse)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Result<&DatasetDescriptor, ConfigError> {
        self.datasets
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ConfigError::UnknownDataset(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.id.as_str())
    }

    /// Whether an already canonical zone code belongs to the fixed enumeration.
    pub fn is_known_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z == zone)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, descriptor) in self.datasets.iter().enumerate() {
            if self.datasets[..i].iter().any(|d| d.id == descriptor.id) {
                return Err(ConfigError::DuplicateDataset(descriptor.id.clone()));
            }
        }
        Ok(())
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::nyiso()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nyiso_registry_has_all_datasets() {
        let registry = DatasetRegistry::nyiso();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(
            ids,
            vec!["load_actual", "load_forecast", "lmp_dayahead", "lmp_realtime", "fuel_mix"]
        );
        assert_eq!(registry.zones.len(), 11);
        assert!(registry.is_known_zone("N.Y.C."));
        assert!(!registry.is_known_zone("n.y.c."));
    }

    #[test]
    fn test_unknown_dataset_is_config_error() {
        let registry = DatasetRegistry::nyiso();
        let err = registry.get("wind_forecast").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDataset(ref id) if id == "wind_forecast"));
    }

    #[test]
    fn test_lmp_datasets_override_suffix() -> Result<(), ConfigError> {
        let registry = DatasetRegistry::nyiso();
        assert_eq!(registry.get("lmp_dayahead")?.url_rule.suffix(), "_zone_csv.zip");
        assert_eq!(registry.get("lmp_realtime")?.url_rule.suffix(), "_zone_csv.zip");
        assert_eq!(registry.get("load_actual")?.url_rule.suffix(), "_csv.zip");
        Ok(())
    }

    #[test]
    fn test_registry_json_roundtrip_and_duplicates() -> Result<(), ConfigError> {
        let registry = DatasetRegistry::nyiso();
        let json = serde_json::to_string(&registry).map_err(ConfigError::RegistryParse)?;
        assert_eq!(DatasetRegistry::from_json_str(&json)?, registry);

        let json = r#"{
            "datasets": [
                {"id": "a", "remote_path_segment": "a", "column_rename_map": {}, "granularity": "daily"},
                {"id": "a", "remote_path_segment": "b", "column_rename_map": {}, "granularity": "monthly"}
            ],
            "zones": [],
            "timezone": "America/New_York"
        }"#;
        let err = DatasetRegistry::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDataset(ref id) if id == "a"));
        Ok(())
    }
}
