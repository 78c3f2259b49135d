// Disease detector port - object detection over a saved upload
use crate::domain::diagnosis::RawDetection;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait DiseaseDetector: Send + Sync {
    /// Detections at or above `conf_threshold`, in the detector's own order
    async fn detect(&self, image_path: &Path, conf_threshold: f64) -> anyhow::Result<Vec<RawDetection>>;

    fn model_name(&self) -> &str;
}
