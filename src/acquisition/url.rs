use crate::error::ConfigError;
use crate::types::dataset::DatasetDescriptor;
use crate::types::period::Period;
use crate::types::registry::DatasetRegistry;
use chrono::NaiveDate;

/// Builds archive addresses of the form
/// `{base}/{segment}/{YYYYMMDD}{segment}{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base_url: String,
}

impl UrlBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Address of the archive covering `date` for `dataset`.
    ///
    /// Monthly datasets are anchored at the first of the month, so any date
    /// inside the month yields the same address.
    pub fn build(
        &self,
        registry: &DatasetRegistry,
        dataset: &str,
        date: NaiveDate,
    ) -> Result<String, ConfigError> {
        let descriptor = registry.get(dataset)?;
        let period = Period::containing(date, descriptor.granularity);
        Ok(self.period_url(descriptor, &period))
    }

    /// Address of the archive for an already resolved period.
    pub fn period_url(&self, descriptor: &DatasetDescriptor, period: &Period) -> String {
        let segment = &descriptor.remote_path_segment;
        format!(
            "{}/{}/{}{}{}",
            self.base_url,
            segment,
            period.token(),
            segment,
            descriptor.url_rule.suffix()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::registry::NYISO_BASE_URL;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_pattern() -> Result<(), ConfigError> {
        let registry = DatasetRegistry::nyiso();
        let urls = UrlBuilder::new(NYISO_BASE_URL);
        assert_eq!(
            urls.build(&registry, "load_actual", date(2024, 1, 1))?,
            "https://mis.nyiso.com/public/csv/pal/20240101pal_csv.zip"
        );
        assert_eq!(
            urls.build(&registry, "fuel_mix", date(2024, 3, 17))?,
            "https://mis.nyiso.com/public/csv/rtfuelmix/20240301rtfuelmix_csv.zip"
        );
        Ok(())
    }

    #[test]
    fn test_override_suffix() -> Result<(), ConfigError> {
        let registry = DatasetRegistry::nyiso();
        let urls = UrlBuilder::new("https://mis.nyiso.com/public/csv/");
        assert_eq!(
            urls.build(&registry, "lmp_dayahead", date(2023, 12, 31))?,
            "https://mis.nyiso.com/public/csv/damlbmp/20231201damlbmp_zone_csv.zip"
        );
        Ok(())
    }

    #[test]
    fn test_deterministic_and_unknown() {
        let registry = DatasetRegistry::nyiso();
        let urls = UrlBuilder::new(NYISO_BASE_URL);
        let a = urls.build(&registry, "load_forecast", date(2024, 5, 9)).ok();
        let b = urls.build(&registry, "load_forecast", date(2024, 5, 9)).ok();
        assert_eq!(a, b);
        assert!(matches!(
            urls.build(&registry, "nope", date(2024, 5, 9)),
            Err(ConfigError::UnknownDataset(_))
        ));
    }
}
