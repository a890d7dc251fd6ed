//! Dashboard configuration
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. The file path comes from `INSIGHT_DASHBOARD_CONFIG` when set.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::palette::Palette;
use crate::CoreError;

/// Environment variable naming a settings file
pub const CONFIG_ENV_VAR: &str = "INSIGHT_DASHBOARD_CONFIG";

/// Tunables for the dashboard engine and app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardSettings {
    /// Rows shown by a sequential chart at zoom 1
    pub display_limit: usize,
    /// Rows per data table page
    pub table_page_size: usize,
    /// Name of the palette preset
    pub palette: String,
    /// Rows kept per report when persisting
    pub preview_rows: usize,
    /// Byte budget for the persisted report list
    pub storage_quota_bytes: usize,
    /// Directory holding the report store; `.insight-dashboard` in the
    /// working directory when unset
    pub store_dir: Option<PathBuf>,
    pub export_width: u32,
    pub export_height: u32,
    /// Percent of rows kept when a dataset is loaded, 1 to 100
    pub sampling_rate: u8,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            display_limit: 100,
            table_page_size: 50,
            palette: "indigo".to_string(),
            preview_rows: 100,
            storage_quota_bytes: 5 * 1024 * 1024,
            store_dir: None,
            export_width: 960,
            export_height: 540,
            sampling_rate: 100,
        }
    }
}

impl DashboardSettings {
    /// Load settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|e| CoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings.sanitized())
    }

    /// Settings from `INSIGHT_DASHBOARD_CONFIG`, or defaults.
    ///
    /// An unreadable file is logged and replaced by defaults.
    pub fn load() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                match Self::from_file(&path) {
                    Ok(settings) => {
                        info!("Using settings from {}", path.display());
                        settings
                    }
                    Err(e) => {
                        warn!("{}; falling back to defaults", e);
                        Self::default()
                    }
                }
            }
            None => Self::default(),
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::by_name(&self.palette)
    }

    /// Repair values that would break the view engine
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.display_limit == 0 {
            self.display_limit = defaults.display_limit;
        }
        if self.table_page_size == 0 {
            self.table_page_size = defaults.table_page_size;
        }
        if self.export_width == 0 || self.export_height == 0 {
            warn!(
                "Ignoring export size {}x{}",
                self.export_width, self.export_height
            );
            self.export_width = defaults.export_width;
            self.export_height = defaults.export_height;
        }
        if self.sampling_rate == 0 || self.sampling_rate > 100 {
            warn!("Ignoring sampling rate {}%", self.sampling_rate);
            self.sampling_rate = defaults.sampling_rate;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tablePageSize": 25, "palette": "ocean", "samplingRate": 40}}"#
        )
        .unwrap();

        let settings = DashboardSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.table_page_size, 25);
        assert_eq!(settings.display_limit, 100);
        assert_eq!(settings.palette().name, "ocean");
        assert_eq!(settings.sampling_rate, 40);
    }

    #[test]
    fn test_bad_values_are_repaired() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tablePageSize": 0, "exportWidth": 0, "displayLimit": 0, "samplingRate": 0}}"#
        )
        .unwrap();

        let settings = DashboardSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.table_page_size, 50);
        assert_eq!(settings.display_limit, 100);
        assert_eq!((settings.export_width, settings.export_height), (960, 540));
        assert_eq!(settings.sampling_rate, 100);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            DashboardSettings::from_file(file.path()),
            Err(CoreError::Config { .. })
        ));
    }
}
