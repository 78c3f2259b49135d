// Diagnosis service - Use case for disease detection, visualization and advice
use crate::application::advisor::{PlantAdvisor, TranslationKind};
use crate::application::disease_detector::DiseaseDetector;
use crate::application::upload_store::{CleanupReport, UploadStore};
use crate::application::worker_pool::WorkerPool;
use crate::domain::diagnosis::{self, DiagnosisReport, DiagnosisStatus, Detection};
use crate::infrastructure::focus_render;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("disease detector is not configured")]
    Unavailable,

    #[error("uploaded file could not be read as an image")]
    InvalidImage(#[source] image::ImageError),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub image: Bytes,
    /// Lowercase, without the dot
    pub extension: String,
    pub conf_threshold: f64,
    pub user_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_translated: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiseaseView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_translated: Option<String>,
    pub full_name: String,
    pub species: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

impl From<&Detection> for DiseaseView {
    fn from(detection: &Detection) -> Self {
        Self {
            name: detection.name.clone(),
            name_translated: None,
            full_name: detection.full_name.clone(),
            species: detection.species.clone(),
            confidence: round4(detection.confidence),
            bbox: detection.bbox,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResponse {
    pub success: bool,
    pub diagnosis_status: DiagnosisStatus,
    pub max_confidence: f64,
    pub detection_count: usize,
    pub species: SpeciesView,
    pub diseases: Vec<DiseaseView>,
    pub result_image: String,
    pub original_image: String,
    pub total_diseases_detected: usize,
    pub status_message: Option<String>,
    pub treatment_advice: Option<String>,
    pub llm_enabled: bool,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Clone)]
pub struct DiagnosisService {
    detector: Option<Arc<dyn DiseaseDetector>>,
    advisor: PlantAdvisor,
    pool: WorkerPool,
    uploads: UploadStore,
}

impl DiagnosisService {
    pub fn new(
        detector: Option<Arc<dyn DiseaseDetector>>,
        advisor: PlantAdvisor,
        pool: WorkerPool,
        uploads: UploadStore,
    ) -> Self {
        Self {
            detector,
            advisor,
            pool,
            uploads,
        }
    }

    pub fn is_available(&self) -> bool {
        self.detector.is_some()
    }

    pub async fn diagnose(&self, request: DiagnosisRequest) -> Result<DiagnosisResponse, DiagnosisError> {
        let detector = self.detector.as_ref().ok_or(DiagnosisError::Unavailable)?;

        let upload = self.uploads.save(&request.image, &request.extension).await?;
        let raw = detector.detect(upload.path(), request.conf_threshold).await?;
        drop(upload);

        let report = DiagnosisReport::classify(raw, true);
        let status = report.status;
        let detections = report.detections.clone();
        let image = request.image.clone();
        let rendered = self
            .pool
            .run(move || -> Result<focus_render::RenderedImages, DiagnosisError> {
                let decoded = focus_render::decode(&image).map_err(DiagnosisError::InvalidImage)?;
                Ok(focus_render::render(&decoded, status, &detections)?)
            })
            .await??;

        let mut response = DiagnosisResponse {
            success: true,
            diagnosis_status: report.status,
            max_confidence: round4(report.max_confidence),
            detection_count: report.detection_count,
            species: SpeciesView {
                name: report.species.clone().unwrap_or_else(|| "Unknown".to_string()),
                name_translated: None,
                confidence: round4(report.species_confidence),
            },
            diseases: report.detections.iter().map(DiseaseView::from).collect(),
            result_image: rendered.result_image,
            original_image: rendered.original_image,
            total_diseases_detected: report.detections.len(),
            status_message: None,
            treatment_advice: None,
            llm_enabled: false,
        };

        match (report.status, report.top()) {
            (DiagnosisStatus::HighConfidence, Some(top)) => {
                self.translate_top(&mut response, top).await;
                response.status_message = Some(diagnosis::high_confidence_message());
                response.treatment_advice = self
                    .advisor
                    .treatment_advice(
                        &top.species,
                        &top.name,
                        top.confidence,
                        request.user_notes.as_deref(),
                    )
                    .await;
                response.llm_enabled = response.treatment_advice.is_some();
            }
            (DiagnosisStatus::MediumConfidence, Some(top)) => {
                let (species, disease) = self.translate_top(&mut response, top).await;
                response.status_message = Some(diagnosis::medium_confidence_message(
                    &species,
                    &disease,
                    report.max_confidence,
                ));
            }
            (DiagnosisStatus::LowConfidence, _) => {
                // Detections this weak are ignored; only the user's own notes are advised on
                if let Some(notes) = request.user_notes.as_deref() {
                    response.treatment_advice = self.advisor.user_notes_advice(notes).await;
                    response.llm_enabled = response.treatment_advice.is_some();
                }
            }
            _ => {
                response.status_message = Some(diagnosis::no_detection_message());
            }
        }

        tracing::info!(
            status = ?response.diagnosis_status,
            species = %response.species.name,
            max_confidence = response.max_confidence,
            diseases = response.total_diseases_detected,
            "Diagnosis finished"
        );
        Ok(response)
    }

    /// Fill in translated names of the top detection and return them
    async fn translate_top(&self, response: &mut DiagnosisResponse, top: &Detection) -> (String, String) {
        let (species, disease) = tokio::join!(
            self.advisor.translate(&top.species, TranslationKind::Plant),
            self.advisor.translate(&top.name, TranslationKind::Disease)
        );
        response.species.name_translated = Some(species.clone());
        if let Some(first) = response.diseases.first_mut() {
            first.name_translated = Some(disease.clone());
        }
        (species, disease)
    }

    pub async fn cleanup(&self) -> anyhow::Result<CleanupReport> {
        self.uploads.cleanup().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::disease_detector::stubs::FixedDetector;
    use crate::application::text_generator::stubs::ScriptedGenerator;
    use crate::application::text_generator::LlmRenderer;
    use crate::domain::diagnosis::RawDetection;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn png() -> Bytes {
        let image = RgbImage::from_pixel(48, 48, Rgb([30, 120, 40]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    fn raw(class_name: &str, confidence: f64) -> RawDetection {
        RawDetection {
            class_name: class_name.to_string(),
            confidence,
            bbox: [8.0, 8.0, 36.0, 36.0],
        }
    }

    fn request(user_notes: Option<&str>) -> DiagnosisRequest {
        DiagnosisRequest {
            image: png(),
            extension: "png".to_string(),
            conf_threshold: 0.01,
            user_notes: user_notes.map(str::to_string),
        }
    }

    fn service(
        detector: Option<Arc<FixedDetector>>,
        advisor: PlantAdvisor,
        dir: &tempfile::TempDir,
    ) -> DiagnosisService {
        DiagnosisService::new(
            detector.map(|d| d as Arc<dyn DiseaseDetector>),
            advisor,
            WorkerPool::new(1),
            UploadStore::new(dir.path().join("uploads"), dir.path().join("results")),
        )
    }

    fn advisor_with(generator: Arc<ScriptedGenerator>) -> PlantAdvisor {
        let renderer = LlmRenderer::new(generator, Duration::from_secs(1));
        PlantAdvisor::new(renderer.clone(), renderer, "English")
    }

    #[tokio::test]
    async fn test_missing_detector_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(None, PlantAdvisor::offline(), &dir);
        let result = service.diagnose(request(None)).await;
        assert!(matches!(result, Err(DiagnosisError::Unavailable)));
    }

    #[tokio::test]
    async fn test_high_confidence_gets_advice() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Arc::new(FixedDetector::new(vec![
            raw("Tomato Early blight", 0.4),
            raw("Tomato Leaf Mold", 0.81234),
        ]));
        let generator = ScriptedGenerator::replying("Remove the affected leaves and improve airflow around the plant.");
        let service = service(Some(detector.clone()), advisor_with(generator), &dir);

        let response = service.diagnose(request(None)).await.unwrap();
        assert_eq!(response.diagnosis_status, DiagnosisStatus::HighConfidence);
        assert_eq!(response.max_confidence, 0.8123);
        assert_eq!(response.detection_count, 2);
        assert_eq!(response.total_diseases_detected, 1);
        assert_eq!(response.diseases[0].name, "Leaf Mold");
        assert_eq!(response.species.name, "Tomato");
        assert_eq!(response.status_message.as_deref(), Some("Diagnosis complete."));
        assert!(response.llm_enabled);
        assert!(response.treatment_advice.is_some());
        assert_ne!(response.result_image, response.original_image);

        // The upload existed while detecting and is gone afterwards
        let seen = detector.seen.lock().unwrap();
        assert!(seen[0].1);
        assert!(!seen[0].0.exists());
    }

    #[tokio::test]
    async fn test_medium_confidence_has_message_without_advice() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Arc::new(FixedDetector::new(vec![raw("Apple scab", 0.3)]));
        let service = service(Some(detector), PlantAdvisor::offline(), &dir);

        let response = service.diagnose(request(Some("spots on leaves"))).await.unwrap();
        assert_eq!(response.diagnosis_status, DiagnosisStatus::MediumConfidence);
        let message = response.status_message.unwrap();
        assert!(message.contains("scab on Apple"));
        assert!(message.contains("30.0%"));
        assert!(response.treatment_advice.is_none());
        assert!(!response.llm_enabled);
        assert_eq!(response.species.name_translated.as_deref(), Some("Apple"));
    }

    #[tokio::test]
    async fn test_low_confidence_uses_user_notes_only() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Arc::new(FixedDetector::new(vec![raw("Corn Gray leaf spot", 0.05)]));
        let generator = ScriptedGenerator::replying("Yellowing lower leaves often point to overwatering.");
        let service = service(Some(detector), advisor_with(generator.clone()), &dir);

        let response = service.diagnose(request(None)).await.unwrap();
        assert_eq!(response.diagnosis_status, DiagnosisStatus::LowConfidence);
        assert!(response.status_message.is_none());
        assert!(!response.llm_enabled);
        assert_eq!(generator.call_count(), 0);

        let response = service
            .diagnose(request(Some("lower leaves turn yellow")))
            .await
            .unwrap();
        assert!(response.llm_enabled);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_detection_message() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Arc::new(FixedDetector::new(Vec::new()));
        let service = service(Some(detector), PlantAdvisor::offline(), &dir);

        let response = service.diagnose(request(None)).await.unwrap();
        assert_eq!(response.diagnosis_status, DiagnosisStatus::NoDetection);
        assert_eq!(response.species.name, "Unknown");
        assert_eq!(response.result_image, response.original_image);
        assert_eq!(response.status_message, Some(diagnosis::no_detection_message()));
    }

    #[tokio::test]
    async fn test_unreadable_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Arc::new(FixedDetector::new(Vec::new()));
        let service = service(Some(detector), PlantAdvisor::offline(), &dir);

        let mut bad = request(None);
        bad.image = Bytes::from_static(b"definitely not a png");
        let result = service.diagnose(bad).await;
        assert!(matches!(result, Err(DiagnosisError::InvalidImage(_))));
    }
}
