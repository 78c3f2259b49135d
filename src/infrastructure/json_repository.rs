// JSON file repository implementation
use crate::application::plant_repository::PlantRepository;
use crate::domain::plant::PlantIdentification;
use crate::domain::records::{newest_for, upsert_record, GrowthRecord, IdentificationRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const IDENTIFICATIONS_FILE: &str = "identifications.json";
const GROWTH_HISTORY_FILE: &str = "growth_history.json";

type Identifications = BTreeMap<String, IdentificationRecord>;
type GrowthHistory = BTreeMap<String, Vec<GrowthRecord>>;

/// Two flat JSON documents under `data_dir`. Every read-modify-write runs
/// under one lock, so concurrent writers for a plant are serialized.
#[derive(Debug)]
pub struct JsonFileRepository {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock: Mutex::new(()),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(value).context("Failed to serialize records")?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl PlantRepository for JsonFileRepository {
    async fn save_identification(
        &self,
        identification: &PlantIdentification,
        file_hash: Option<String>,
    ) -> Result<String> {
        let _guard = self.lock.lock().await;
        let path = self.path(IDENTIFICATIONS_FILE);

        let mut records: Identifications = read_json(&path).await?;
        let record = IdentificationRecord::new(identification.clone(), file_hash, chrono::Local::now());
        let id = record.id.clone();
        records.insert(id.clone(), record);
        write_json(&path, &records).await?;

        Ok(id)
    }

    async fn load_identification(
        &self,
        data_id: Option<&str>,
        plant_name: Option<&str>,
    ) -> Result<Option<IdentificationRecord>> {
        let _guard = self.lock.lock().await;
        let records: Identifications = read_json(&self.path(IDENTIFICATIONS_FILE)).await?;

        let found = match (data_id, plant_name) {
            (Some(id), _) => records.get(id),
            (None, Some(name)) => newest_for(records.values(), name),
            (None, None) => None,
        };
        Ok(found.cloned())
    }

    async fn save_growth_record(&self, plant_id: &str, record: GrowthRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.path(GROWTH_HISTORY_FILE);

        let mut history: GrowthHistory = read_json(&path).await?;
        upsert_record(history.entry(plant_id.to_string()).or_default(), record);
        write_json(&path, &history).await
    }

    async fn growth_history(&self, plant_id: &str) -> Result<Vec<GrowthRecord>> {
        let _guard = self.lock.lock().await;
        let mut history: GrowthHistory = read_json(&self.path(GROWTH_HISTORY_FILE)).await?;
        let mut records = history.remove(plant_id).unwrap_or_default();
        records.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn identification(name: &str, confidence: f64) -> PlantIdentification {
        PlantIdentification {
            plant_name: name.to_string(),
            scientific_name: None,
            confidence,
            common_names: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path().join("data"));

        assert!(repository.growth_history("fern").await.unwrap().is_empty());
        assert!(repository
            .load_identification(None, Some("Fern"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_growth_records_upsert_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path());

        repository
            .save_growth_record("fern", GrowthRecord::new("2024-06-10", 14.0))
            .await
            .unwrap();
        repository
            .save_growth_record("fern", GrowthRecord::new("2024-06-01", 12.0))
            .await
            .unwrap();
        repository
            .save_growth_record("fern", GrowthRecord::new("2024-06-10", 15.5))
            .await
            .unwrap();

        let history = repository.growth_history("fern").await.unwrap();
        assert_eq!(
            history,
            vec![
                GrowthRecord::new("2024-06-01", 12.0),
                GrowthRecord::new("2024-06-10", 15.5)
            ]
        );

        // Survives a fresh repository over the same directory
        let reopened = JsonFileRepository::new(dir.path());
        assert_eq!(reopened.growth_history("fern").await.unwrap(), history);
    }

    #[tokio::test]
    async fn test_identification_by_id_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path());

        let id = repository
            .save_identification(&identification("Aloe Vera", 0.9), Some("hash".to_string()))
            .await
            .unwrap();
        assert!(id.starts_with("Aloe Vera_"));

        let by_id = repository
            .load_identification(Some(&id), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.file_hash.as_deref(), Some("hash"));

        let by_name = repository
            .load_identification(None, Some("Aloe Vera"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.identification.confidence, 0.9);

        assert!(repository
            .load_identification(Some("missing"), Some("Aloe Vera"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(JsonFileRepository::new(dir.path()));

        let writes = (1..=20).map(|day| {
            let repository = repository.clone();
            tokio::spawn(async move {
                repository
                    .save_growth_record("ivy", GrowthRecord::new(format!("2024-07-{day:02}"), day as f64))
                    .await
            })
        });
        for write in futures::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        let history = repository.growth_history("ivy").await.unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].date, "2024-07-01");
        assert_eq!(history[19].date, "2024-07-20");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GROWTH_HISTORY_FILE), b"{not json").unwrap();
        let repository = JsonFileRepository::new(dir.path());
        assert!(repository.growth_history("fern").await.is_err());
    }
}
