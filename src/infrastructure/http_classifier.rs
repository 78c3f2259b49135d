// HTTP plant classifiers - image classification services reached over multipart POST
use crate::application::plant_classifier::PlantClassifier;
use crate::domain::plant::{format_plant_name, PlantIdentification};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

const UPLOAD_FILE_NAME: &str = "plant.jpg";

fn build_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .context("Failed to build classifier HTTP client")
}

async fn post_image(
    client: &reqwest::Client,
    url: &str,
    field: &'static str,
    image: Bytes,
) -> Result<reqwest::Response> {
    let part = Part::stream(image)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str("image/jpeg")?;
    let form = Form::new().part(field, part);

    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Failed to send image to {}", url))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Classifier at {} failed with status {}: {}", url, status, body);
    }
    Ok(response)
}

/// Classifier served by the in-house model service: multipart field `file`,
/// answer `{"prediction": [{"class", "probability"}]}` sorted best first
#[derive(Debug, Clone)]
pub struct ModelServerClassifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ModelServerResponse {
    #[serde(default)]
    prediction: Vec<ModelServerPrediction>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelServerPrediction {
    class: String,
    probability: f64,
}

impl ModelServerClassifier {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(request_timeout)?,
            url: url.into(),
        })
    }
}

/// The model service reports percentages; identifications carry fractions
fn normalize_probability(probability: f64) -> f64 {
    if probability > 1.0 {
        (probability / 100.0).min(1.0)
    } else {
        probability.max(0.0)
    }
}

fn from_model_server(response: ModelServerResponse) -> Result<PlantIdentification> {
    if let Some(error) = response.error {
        anyhow::bail!("Model service error: {}", error);
    }

    let mut predictions = response.prediction;
    predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    let top = predictions.first().context("Model service returned no predictions")?;

    Ok(PlantIdentification {
        plant_name: format_plant_name(&top.class),
        scientific_name: None,
        confidence: normalize_probability(top.probability),
        common_names: predictions
            .iter()
            .take(3)
            .map(|p| format_plant_name(&p.class))
            .collect(),
    })
}

#[async_trait]
impl PlantClassifier for ModelServerClassifier {
    async fn identify(&self, image: Bytes) -> Result<PlantIdentification> {
        let response = post_image(&self.client, &self.url, "file", image).await?;
        let data = response
            .json::<ModelServerResponse>()
            .await
            .context("Failed to parse model service response")?;
        from_model_server(data)
    }

    fn model_name(&self) -> &str {
        "model-service"
    }
}

/// PlantRecog public API: multipart field `image`, answer
/// `{"message": "Success", "payload": {"predictions": [{"name", "score"}]}}`
#[derive(Debug, Clone)]
pub struct PlantRecogClassifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PlantRecogResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    payload: Option<PlantRecogPayload>,
}

#[derive(Debug, Deserialize)]
struct PlantRecogPayload {
    #[serde(default)]
    predictions: Vec<PlantRecogPrediction>,
}

#[derive(Debug, Deserialize)]
struct PlantRecogPrediction {
    name: String,
    score: f64,
}

impl PlantRecogClassifier {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(request_timeout)?,
            url: url.into(),
        })
    }
}

fn from_plant_recog(response: PlantRecogResponse) -> Result<PlantIdentification> {
    if response.message != "Success" {
        anyhow::bail!("PlantRecog answered '{}'", response.message);
    }
    let predictions = response
        .payload
        .map(|p| p.predictions)
        .unwrap_or_default();
    let (top, rest) = predictions
        .split_first()
        .context("PlantRecog returned no predictions")?;

    Ok(PlantIdentification {
        plant_name: format_plant_name(&top.name),
        scientific_name: None,
        confidence: top.score.clamp(0.0, 1.0),
        common_names: rest.iter().take(3).map(|p| format_plant_name(&p.name)).collect(),
    })
}

#[async_trait]
impl PlantClassifier for PlantRecogClassifier {
    async fn identify(&self, image: Bytes) -> Result<PlantIdentification> {
        let response = post_image(&self.client, &self.url, "image", image).await?;
        let data = response
            .json::<PlantRecogResponse>()
            .await
            .context("Failed to parse PlantRecog response")?;
        from_plant_recog(data)
    }

    fn model_name(&self) -> &str {
        "plantrecog"
    }
}
