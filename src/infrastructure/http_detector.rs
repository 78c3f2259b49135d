// HTTP disease detector - object detection service reached over multipart POST
use crate::application::disease_detector::DiseaseDetector;
use crate::domain::diagnosis::RawDetection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDetector {
    client: reqwest::Client,
    url: String,
}

/// The service answers with a bare list or wraps it in `detections`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectorResponse {
    List(Vec<RawDetection>),
    Wrapped { detections: Vec<RawDetection> },
}

impl DetectorResponse {
    fn into_detections(self) -> Vec<RawDetection> {
        match self {
            DetectorResponse::List(detections) => detections,
            DetectorResponse::Wrapped { detections } => detections,
        }
    }
}

impl HttpDetector {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build detector HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DiseaseDetector for HttpDetector {
    async fn detect(&self, image_path: &Path, conf_threshold: f64) -> Result<Vec<RawDetection>> {
        let image = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("Failed to read upload {}", image_path.display()))?;
        let file_name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.jpg")
            .to_string();

        let form = Form::new()
            .part("file", Part::bytes(image).file_name(file_name))
            .text("conf", conf_threshold.to_string());

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request to disease detector")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Disease detector failed with status {}: {}", status, body);
        }

        let detections = response
            .json::<DetectorResponse>()
            .await
            .context("Failed to parse disease detector response")?
            .into_detections();

        tracing::debug!(
            count = detections.len(),
            conf_threshold,
            "Detector returned detections"
        );
        Ok(detections)
    }

    fn model_name(&self) -> &str {
        "http-detector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_list_response() {
        let raw = r#"[{"class_name":"Tomato Leaf Mold","confidence":0.8,"bbox":[1.0,2.0,30.5,40.0]}]"#;
        let detections = serde_json::from_str::<DetectorResponse>(raw)
            .unwrap()
            .into_detections();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "Tomato Leaf Mold");
        assert_eq!(detections[0].bbox, [1.0, 2.0, 30.5, 40.0]);
    }

    #[test]
    fn test_wrapped_response() {
        let raw = r#"{"detections":[
            {"class_name":"Apple scab","confidence":0.3,"bbox":[0,0,10,10]},
            {"class_name":"Apple healthy","confidence":0.2,"bbox":[5,5,20,20]}
        ]}"#;
        let detections = serde_json::from_str::<DetectorResponse>(raw)
            .unwrap()
            .into_detections();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[1].confidence, 0.2);
    }

    #[test]
    fn test_empty_response() {
        let detections = serde_json::from_str::<DetectorResponse>("[]")
            .unwrap()
            .into_detections();
        assert!(detections.is_empty());
    }
}
