// Plant classifier port, auto-selection and the identification use case
use crate::application::advisor::PlantAdvisor;
use crate::domain::plant::PlantIdentification;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

#[async_trait]
pub trait PlantClassifier: Send + Sync {
    /// Identify the plant in an encoded image. Names are returned in English.
    async fn identify(&self, image: Bytes) -> anyhow::Result<PlantIdentification>;

    /// Human readable model description
    fn model_name(&self) -> &str;
}

/// Runs two classifiers side by side and keeps the primary answer when it
/// is confident enough, the secondary one otherwise
pub struct AutoSelectClassifier {
    primary: Arc<dyn PlantClassifier>,
    secondary: Arc<dyn PlantClassifier>,
    threshold: f64,
}

impl AutoSelectClassifier {
    pub fn new(
        primary: Arc<dyn PlantClassifier>,
        secondary: Arc<dyn PlantClassifier>,
        threshold: f64,
    ) -> Self {
        Self {
            primary,
            secondary,
            threshold,
        }
    }
}

#[async_trait]
impl PlantClassifier for AutoSelectClassifier {
    async fn identify(&self, image: Bytes) -> anyhow::Result<PlantIdentification> {
        let (primary, secondary) = tokio::join!(
            self.primary.identify(image.clone()),
            self.secondary.identify(image)
        );

        match primary {
            Ok(result) if result.confidence >= self.threshold => {
                tracing::debug!(
                    model = self.primary.model_name(),
                    confidence = result.confidence,
                    "Auto-select kept primary classifier"
                );
                Ok(result)
            }
            Ok(result) => {
                tracing::debug!(
                    confidence = result.confidence,
                    threshold = self.threshold,
                    "Primary classifier below threshold, using secondary"
                );
                secondary
            }
            Err(e) => {
                tracing::warn!(model = self.primary.model_name(), error = %e, "Primary classifier failed, using secondary");
                secondary
            }
        }
    }

    fn model_name(&self) -> &str {
        "auto-select"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierChoice {
    Primary,
    Secondary,
    Auto,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    pub name: String,
    pub result: PlantIdentification,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelComparison {
    pub primary: ModelResult,
    pub secondary: ModelResult,
}

#[derive(Clone)]
pub struct ClassifierService {
    primary: Arc<dyn PlantClassifier>,
    secondary: Arc<dyn PlantClassifier>,
    auto: Arc<dyn PlantClassifier>,
    advisor: PlantAdvisor,
    translate_names: bool,
}

impl ClassifierService {
    pub fn new(
        primary: Arc<dyn PlantClassifier>,
        secondary: Arc<dyn PlantClassifier>,
        auto_select_threshold: f64,
        advisor: PlantAdvisor,
        translate_names: bool,
    ) -> Self {
        let auto: Arc<dyn PlantClassifier> = Arc::new(AutoSelectClassifier::new(
            primary.clone(),
            secondary.clone(),
            auto_select_threshold,
        ));
        Self {
            primary,
            secondary,
            auto,
            advisor,
            translate_names,
        }
    }

    fn classifier(&self, choice: ClassifierChoice) -> &Arc<dyn PlantClassifier> {
        match choice {
            ClassifierChoice::Primary => &self.primary,
            ClassifierChoice::Secondary => &self.secondary,
            ClassifierChoice::Auto => &self.auto,
        }
    }

    /// Identify a plant. Never fails: a classifier error yields the neutral
    /// "unidentified" result.
    pub async fn identify(&self, image: Bytes, choice: ClassifierChoice) -> PlantIdentification {
        self.identify_with(self.classifier(choice).as_ref(), image).await
    }

    async fn identify_with(&self, classifier: &dyn PlantClassifier, image: Bytes) -> PlantIdentification {
        match classifier.identify(image).await {
            Ok(identification) => {
                tracing::info!(
                    model = classifier.model_name(),
                    plant = %identification.plant_name,
                    confidence = identification.confidence,
                    "Plant identified"
                );
                if self.translate_names {
                    self.advisor.translate_identification(identification).await
                } else {
                    identification
                }
            }
            Err(e) => {
                tracing::error!(model = classifier.model_name(), error = %e, "Plant classification failed");
                PlantIdentification::unidentified()
            }
        }
    }

    pub async fn compare(&self, image: Bytes) -> ModelComparison {
        let (primary, secondary) = tokio::join!(
            self.identify_with(self.primary.as_ref(), image.clone()),
            self.identify_with(self.secondary.as_ref(), image)
        );
        ModelComparison {
            primary: ModelResult {
                name: self.primary.model_name().to_string(),
                result: primary,
            },
            secondary: ModelResult {
                name: self.secondary.model_name().to_string(),
                result: secondary,
            },
        }
    }
}
