// Growth log service - Use case for measured heights and their short-term outlook
use crate::application::plant_repository::PlantRepository;
use crate::domain::records::{
    comparison_comment, naive_projection, GrowthRecord, ProjectedHeight,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct GrowthLog {
    pub history: Vec<GrowthRecord>,
    pub prediction: Vec<ProjectedHeight>,
    pub compare_comment: String,
    pub analysis: String,
    pub care_tip: String,
}

#[derive(Clone)]
pub struct GrowthLogService {
    repository: Arc<dyn PlantRepository>,
}

impl GrowthLogService {
    pub fn new(repository: Arc<dyn PlantRepository>) -> Self {
        Self { repository }
    }

    pub async fn record(&self, plant_id: &str, record: GrowthRecord) -> anyhow::Result<()> {
        tracing::debug!(plant_id, date = %record.date, height = record.height, "Recording growth");
        self.repository.save_growth_record(plant_id, record).await
    }

    /// `None` when the plant has no records yet
    pub async fn log(&self, plant_id: &str) -> anyhow::Result<Option<GrowthLog>> {
        let history = self.repository.growth_history(plant_id).await?;
        if history.is_empty() {
            return Ok(None);
        }

        Ok(Some(GrowthLog {
            prediction: naive_projection(&history),
            compare_comment: comparison_comment(&history),
            analysis: "Growth data updated".to_string(),
            care_tip: format!(
                "Care tips for {plant_id}: keep it in bright indirect light and water when the top soil is dry."
            ),
            history,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::plant_repository::stubs::InMemoryRepository;

    fn service() -> GrowthLogService {
        GrowthLogService::new(Arc::new(InMemoryRepository::default()))
    }

    #[tokio::test]
    async fn test_empty_log_is_none() {
        assert!(service().log("fern-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_log_projects_from_last_record() {
        let service = service();
        service
            .record("fern-1", GrowthRecord::new("2024-05-08", 14.0))
            .await
            .unwrap();
        service
            .record("fern-1", GrowthRecord::new("2024-05-01", 11.5))
            .await
            .unwrap();

        let log = service.log("fern-1").await.unwrap().unwrap();
        assert_eq!(log.history[0].date, "2024-05-01");
        assert_eq!(log.prediction.len(), 7);
        assert_eq!(log.prediction[0].height, 15.0);
        assert_eq!(log.compare_comment, "2.5cm increase compared with the previous record");
        assert!(log.care_tip.contains("fern-1"));
    }

    #[tokio::test]
    async fn test_same_date_overwrites() {
        let service = service();
        service
            .record("fern-1", GrowthRecord::new("2024-05-01", 10.0))
            .await
            .unwrap();
        service
            .record("fern-1", GrowthRecord::new("2024-05-01", 10.8))
            .await
            .unwrap();

        let log = service.log("fern-1").await.unwrap().unwrap();
        assert_eq!(log.history, vec![GrowthRecord::new("2024-05-01", 10.8)]);
        assert_eq!(log.compare_comment, "-");
    }
}
