use std::time::Duration;

use super::constants::{DEFAULT_INTERVAL_MS, DEFAULT_LIBRARY_TIMEOUT_MS};
use crate::{
    config::Config,
    dictionary::{CatalogError, DictionaryCatalog},
    vision::RefineConfig,
};

/// Detection parameters resolved from the `[Detection]` and `[Refine]`
/// configuration sections.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    pub interval: Duration,
    pub library_timeout: Duration,
    pub catalog: DictionaryCatalog,
    pub refine: RefineConfig,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            library_timeout: Duration::from_millis(DEFAULT_LIBRARY_TIMEOUT_MS),
            catalog: DictionaryCatalog::builtin(),
            refine: RefineConfig::default(),
        }
    }
}

impl DetectionSettings {
    /// Unparsable numbers fall back to their defaults.
    ///
    /// # Errors
    /// Returns [`CatalogError`] if `[Detection] dictionaries` names an
    /// unknown dictionary or repeats one.
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let defaults = Self::default();

        let catalog = match config.get_non_empty("Detection", "dictionaries") {
            Some(list) => {
                let keys: Vec<&str> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .collect();
                defaults.catalog.select(&keys)?
            }
            None => defaults.catalog,
        };

        let millis = |key: &str, default: Duration| {
            config
                .get("Detection", key)
                .and_then(|s| s.parse::<u64>().ok())
                .map_or(default, Duration::from_millis)
        };
        let refine_f32 = |key: &str, default: f32| {
            config
                .get("Refine", key)
                .and_then(|s| s.parse::<f32>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(default)
        };

        Ok(Self {
            interval: millis("interval_ms", defaults.interval).max(Duration::from_millis(1)),
            library_timeout: millis("library_timeout_ms", defaults.library_timeout),
            catalog,
            refine: RefineConfig {
                min_rep_distance: refine_f32("min_rep_distance", defaults.refine.min_rep_distance),
                error_correction_rate: refine_f32(
                    "error_correction_rate",
                    defaults.refine.error_correction_rate,
                ),
                check_all_orders: config
                    .get_bool("Refine", "check_all_orders")
                    .unwrap_or(defaults.refine.check_all_orders),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn defaults_without_config() {
        let s = DetectionSettings::from_config(&Config::empty()).unwrap();
        assert_eq!(s, DetectionSettings::default());
        assert_eq!(s.interval, Duration::from_millis(100));
        assert_eq!(s.catalog.len(), 17);
        assert!(s.refine.check_all_orders);
    }

    #[test]
    fn reads_sections() {
        let config = Config::parse(
            "[Detection]\ninterval_ms = 50\nlibrary_timeout_ms = 2000\n\
             dictionaries = DICT_6X6_250, DICT_4X4_50\n\
             [Refine]\nmin_rep_distance = 4.5\nerror_correction_rate = 0.6\ncheck_all_orders = false\n",
        );
        let s = DetectionSettings::from_config(&config).unwrap();
        assert_eq!(s.interval, Duration::from_millis(50));
        assert_eq!(s.library_timeout, Duration::from_secs(2));
        let keys: Vec<&str> = s.catalog.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, ["DICT_6X6_250", "DICT_4X4_50"]);
        assert_eq!(
            s.refine,
            RefineConfig {
                min_rep_distance: 4.5,
                error_correction_rate: 0.6,
                check_all_orders: false,
            }
        );
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = Config::parse("[Detection]\ninterval_ms = fast\n[Refine]\nmin_rep_distance = -1\n");
        let s = DetectionSettings::from_config(&config).unwrap();
        assert_eq!(s.interval, Duration::from_millis(100));
        assert!((s.refine.min_rep_distance - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_dictionary_is_an_error() {
        let config = Config::parse("[Detection]\ndictionaries = DICT_4X4_50, DICT_3X3_9\n");
        assert_eq!(
            DetectionSettings::from_config(&config),
            Err(CatalogError::UnknownKey("DICT_3X3_9".into()))
        );
    }
}
