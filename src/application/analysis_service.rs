// Analysis service - Use case for identify-then-advise plant analyses
use crate::application::advisor::PlantAdvisor;
use crate::application::plant_classifier::{ClassifierChoice, ClassifierService};
use crate::application::worker_pool::WorkerPool;
use crate::domain::plant::{CareGuide, GrowthPrediction, PlantIdentification, GENERIC_PLANT_NAME};
use bytes::Bytes;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PlantAnalysis {
    pub identification: PlantIdentification,
    pub care_guide: CareGuide,
    pub growth_prediction: GrowthPrediction,
    pub success: bool,
    pub message: String,
}

#[derive(Clone)]
pub struct AnalysisService {
    classifiers: ClassifierService,
    advisor: PlantAdvisor,
    pool: WorkerPool,
    low_confidence_threshold: f64,
}

impl AnalysisService {
    pub fn new(
        classifiers: ClassifierService,
        advisor: PlantAdvisor,
        pool: WorkerPool,
        low_confidence_threshold: f64,
    ) -> Self {
        Self {
            classifiers,
            advisor,
            pool,
            low_confidence_threshold,
        }
    }

    pub async fn analyze(&self, image: Bytes, choice: ClassifierChoice) -> PlantAnalysis {
        let identification = self.classifiers.identify(image, choice).await;
        let confident = identification.confidence >= self.low_confidence_threshold;
        let guide_name = if confident {
            identification.plant_name.clone()
        } else {
            tracing::info!(
                confidence = identification.confidence,
                "Low identification confidence, using generic houseplant guide"
            );
            GENERIC_PLANT_NAME.to_string()
        };

        let (care_guide, growth_prediction) = tokio::join!(
            self.advisor.care_guide(&guide_name),
            self.growth_prediction(&identification.plant_name)
        );

        let message = if confident {
            format!("{} analysis complete", identification.plant_name)
        } else {
            "The plant could not be identified with confidence. Showing general houseplant care; \
             try a clearer photo for a specific guide."
                .to_string()
        };

        PlantAnalysis {
            identification,
            care_guide,
            growth_prediction,
            success: confident,
            message,
        }
    }

    async fn growth_prediction(&self, plant_name: &str) -> GrowthPrediction {
        let name = plant_name.to_string();
        match self.pool.run(move || GrowthPrediction::default_for(&name)).await {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::error!(error = %e, "Growth prediction worker failed");
                GrowthPrediction::default_for(plant_name)
            }
        }
    }
}
