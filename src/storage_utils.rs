use crate::daily_bars::FetchSettings;
use crate::indicators::IndicatorSettings;
use crate::scheduler::SchedulerSettings;
use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;

// CONFIGURATION STRUCTS
// Every field has a default, so a partial (or absent) config.json still runs.

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorkerConfig {
    pub workers: usize, // concurrent instrument pipelines
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { workers: 8 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DisplayConfig {
    pub signal_table: bool, // also print the per-row signal table
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// CSV with `ticker` and `name` columns. Relative paths resolve against
    /// the storage directory.
    pub catalog_path: PathBuf,
    pub fetch: FetchSettings,
    pub scheduler: WorkerConfig,
    pub analysis: IndicatorSettings,
    pub display: DisplayConfig,
    pub log_level: String, // e.g., "info", "debug"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("kospi_data.csv"),
            fetch: FetchSettings::default(),
            scheduler: WorkerConfig::default(),
            analysis: IndicatorSettings::default(),
            display: DisplayConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            workers: self.scheduler.workers,
            pages: self.fetch.pages,
            indicators: self.analysis,
        }
    }
}

// STORAGE MANAGER

pub struct AsyncStorageManager {
    // Absolute path to the storage directory (e.g., ".../target/debug/storage")
    pub base_dir: PathBuf,
}

impl AsyncStorageManager {
    /// Storage directory relative to the running executable, created on first use.
    pub async fn new_relative<P: AsRef<Path>>(relative_path: P) -> anyhow::Result<Self> {
        let exe_path = std::env::current_exe()?;

        let base_dir = exe_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Could not find binary directory"))?
            .join(relative_path);

        Self::at(base_dir).await
    }

    pub async fn at<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir).await?;
        }
        Ok(Self { base_dir })
    }

    /// Absolute paths pass through; relative ones land in the storage directory.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Writes through a `.tmp` sibling and renames, so readers never see a
    /// half-written file.
    pub async fn save_text(&self, file_name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let final_path = self.base_dir.join(file_name);
        let tmp_path = self.base_dir.join(format!("{}.tmp", file_name));

        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, &final_path).await?;

        Ok(final_path)
    }

    /// Reads `<filename>.json` into `T`.
    pub async fn load<T: DeserializeOwned>(&self, filename: &str) -> anyhow::Result<T> {
        let path = self.base_dir.join(format!("{}.json", filename));

        // serde_json validates UTF-8 itself, so skip `read_to_string`.
        let content = fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;

        let data = serde_json::from_slice(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(data)
    }

    /// Like [`load`](Self::load), but a missing file yields `T::default()`.
    pub async fn load_or_default<T: DeserializeOwned + Default>(&self, filename: &str) -> anyhow::Result<T> {
        let path = self.base_dir.join(format!("{}.json", filename));
        if !fs::try_exists(&path).await? {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(T::default());
        }
        self.load(filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "fetch": { "pages": 3 }, "analysis": { "dedupe_dates": true } }"#,
        )
        .unwrap();

        assert_eq!(config.fetch.pages, 3);
        assert_eq!(config.fetch.page_timeout_secs, 10);
        assert_eq!(config.scheduler.workers, 8);
        assert!(config.analysis.dedupe_dates);
        assert!(!config.display.signal_table);

        let settings = config.scheduler_settings();
        assert_eq!(settings.pages, 3);
        assert_eq!(settings.workers, 8);
        assert!(settings.indicators.dedupe_dates);
    }

    #[tokio::test]
    async fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::at(dir.path()).await.unwrap();

        let config: AppConfig = storage.load_or_default("config").await.unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("kospi_data.csv"));
        assert_eq!(storage.resolve(&config.catalog_path), dir.path().join("kospi_data.csv"));
    }

    #[tokio::test]
    async fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let storage = AsyncStorageManager::at(dir.path()).await.unwrap();

        assert!(storage.load_or_default::<AppConfig>("config").await.is_err());
    }

    #[tokio::test]
    async fn save_text_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::at(dir.path()).await.unwrap();

        storage.save_text("report.txt", "first").await.unwrap();
        let path = storage.save_text("report.txt", "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
        assert!(!dir.path().join("report.txt.tmp").exists());
    }
}
