// Application state for HTTP handlers
use crate::application::advisor::PlantAdvisor;
use crate::application::analysis_service::AnalysisService;
use crate::application::diagnosis_service::DiagnosisService;
use crate::application::growth_log_service::GrowthLogService;
use crate::application::growth_service::GrowthService;
use crate::application::plant_classifier::ClassifierService;
use crate::infrastructure::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub advisor: PlantAdvisor,
    pub classifier_service: ClassifierService,
    pub analysis_service: AnalysisService,
    pub growth_service: GrowthService,
    pub growth_log_service: GrowthLogService,
    pub diagnosis_service: DiagnosisService,
}
