// Plant advisor - LLM-backed advice, translation and care guides with template fallbacks
use crate::application::text_generator::LlmRenderer;
use crate::domain::narrative::{self, PeriodFacts, SeriesSummary};
use crate::domain::plant::{CareGuide, PlantIdentification};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const MIN_ANALYSIS_CHARS: usize = 20;
const MIN_PERIOD_SUMMARY_CHARS: usize = 50;
const MIN_ADVICE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationKind {
    Plant,
    Disease,
}

impl TranslationKind {
    fn system_prompt(&self, language: &str) -> String {
        match self {
            TranslationKind::Plant => format!(
                "You are a botanical translator. Translate plant names into the {language} names commonly used by gardeners. Return only the name."
            ),
            TranslationKind::Disease => format!(
                "You are a plant pathology translator. Translate plant disease names into {language} using the accepted technical terms. Return only the name."
            ),
        }
    }
}

/// Care guide as returned by the model; missing sections are filled later
#[derive(Debug, Deserialize)]
struct CareGuideAnswer {
    #[serde(default)]
    watering: String,
    #[serde(default)]
    sunlight: String,
    #[serde(default)]
    temperature: String,
    #[serde(default)]
    humidity: String,
    #[serde(default)]
    fertilizer: String,
    #[serde(default)]
    soil: String,
    #[serde(default)]
    tips: Vec<String>,
}

#[derive(Clone)]
pub struct PlantAdvisor {
    /// Short, latency-sensitive calls (narratives, translations)
    quick: LlmRenderer,
    /// Long-form advice and care guides
    thorough: LlmRenderer,
    language: String,
    translations: Arc<RwLock<HashMap<(TranslationKind, String), String>>>,
}

impl PlantAdvisor {
    pub fn new(quick: LlmRenderer, thorough: LlmRenderer, language: impl Into<String>) -> Self {
        Self {
            quick,
            thorough,
            language: language.into(),
            translations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Advisor that only ever uses templates
    pub fn offline() -> Self {
        Self::new(LlmRenderer::disabled(), LlmRenderer::disabled(), "English")
    }

    pub fn is_enabled(&self) -> bool {
        self.thorough.is_enabled()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn needs_translation(&self) -> bool {
        !self.language.eq_ignore_ascii_case("english")
    }

    /// Translate a name into the response language; returns the source text
    /// when translation is off or fails
    pub async fn translate(&self, text: &str, kind: TranslationKind) -> String {
        let text = text.trim();
        if text.is_empty() || !self.needs_translation() || !self.quick.is_enabled() {
            return text.to_string();
        }

        let key = (kind, text.to_string());
        if let Some(cached) = self.translations.read().await.get(&key) {
            return cached.clone();
        }

        let prompt = format!("Translate this name into {}: {}", self.language, text);
        let system = kind.system_prompt(&self.language);
        match self.quick.render_with(Some(&system), &prompt, 1, 50, 0.3).await {
            Some(answer) => {
                let translated = clean_translation(&answer);
                if translated.is_empty() {
                    return text.to_string();
                }
                tracing::debug!(source = text, translated = %translated, "Translated name");
                self.translations.write().await.insert(key, translated.clone());
                translated
            }
            None => text.to_string(),
        }
    }

    pub async fn translate_identification(&self, mut identification: PlantIdentification) -> PlantIdentification {
        let english = identification.plant_name.clone();
        identification.plant_name = self.translate(&english, TranslationKind::Plant).await;
        if identification.scientific_name.is_none() {
            identification.scientific_name = Some(english);
        }
        let mut common_names = Vec::with_capacity(identification.common_names.len());
        for name in &identification.common_names {
            common_names.push(self.translate(name, TranslationKind::Plant).await);
        }
        identification.common_names = common_names;
        identification
    }

    pub async fn treatment_advice(
        &self,
        species: &str,
        disease: &str,
        confidence: f64,
        user_notes: Option<&str>,
    ) -> Option<String> {
        let system = format!(
            "You are a plant disease expert. Give farmers and home gardeners practical, easy to follow \
             treatment and prevention advice. Answer in {} in a friendly, professional tone with concrete steps.",
            self.language
        );
        let prompt = treatment_prompt(species, disease, confidence, user_notes);
        self.thorough
            .render_with(Some(&system), &prompt, MIN_ADVICE_CHARS, 800, 0.7)
            .await
    }

    /// Advice written from the user's own description only
    pub async fn user_notes_advice(&self, user_notes: &str) -> Option<String> {
        let notes = user_notes.trim();
        if notes.is_empty() {
            return None;
        }
        let system = "You are a plant disease expert. Advise as far as the user's description allows, \
                      and point out that an exact diagnosis needs more information or an expert.";
        let prompt = format!(
            "A user describes the symptoms of their plant as follows:\n\n\"{notes}\"\n\n\
             Based only on this description, give practical advice covering:\n\
             1. Symptom analysis (3-4 sentences): a general reading of the symptoms and possible causes\n\
             2. Immediate actions: what to do right now and how to stop further damage\n\
             3. General care: watering, ventilation, light and prevention tips\n\
             4. When to consult an expert, for example a pathogen test\n\n\
             Answer in {language}, practically and concretely.",
            language = self.language
        );
        self.thorough
            .render_with(Some(system), &prompt, MIN_ADVICE_CHARS, 600, 0.7)
            .await
    }

    /// Model-written care guide, or the default guide when the model is
    /// unavailable or answers with something that is not a guide
    pub async fn care_guide(&self, plant_name: &str) -> CareGuide {
        let system = "You are a plant care expert for indoor cultivation with broad knowledge of plants \
                      from around the world. Always respond with valid JSON only, no additional text.";
        let prompt = care_guide_prompt(plant_name, &self.language);

        let Some(answer) = self
            .thorough
            .render_with(Some(system), &prompt, 2, 1000, 0.7)
            .await
        else {
            return CareGuide::default_for(plant_name);
        };

        match parse_care_guide(&answer) {
            Some(guide) => guide.or_defaults(plant_name),
            None => {
                tracing::warn!(plant = plant_name, "Care guide answer was not valid JSON, using default guide");
                CareGuide::default_for(plant_name)
            }
        }
    }

    pub async fn period_summary(
        &self,
        facts: &PeriodFacts<'_>,
        identification: Option<&PlantIdentification>,
    ) -> String {
        let prompt = narrative::period_summary_prompt(facts, identification, &self.language);
        self.quick
            .render_or(None, &prompt, MIN_PERIOD_SUMMARY_CHARS, || {
                narrative::period_summary_fallback(facts)
            })
            .await
    }

    pub async fn plant_analysis(&self, summary: &SeriesSummary<'_>) -> String {
        let system = format!(
            "You are a gardening assistant who gives concise advice in {}.",
            self.language
        );
        let prompt = narrative::plant_analysis_prompt(summary, &self.language);
        self.quick
            .render_or(Some(&system), &prompt, MIN_ANALYSIS_CHARS, || {
                narrative::plant_analysis_fallback(summary)
            })
            .await
    }
}

fn clean_translation(answer: &str) -> String {
    answer
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '.')
        .trim()
        .to_string()
}

fn treatment_prompt(species: &str, disease: &str, confidence: f64, user_notes: Option<&str>) -> String {
    let mut prompt = format!(
        "Plant disease diagnosis:\n- Species: {species}\n- Disease/condition: {disease}\n- Model confidence: {:.1}%\n",
        confidence * 100.0
    );
    if let Some(notes) = user_notes.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str(&format!("\nAdditional information from the user:\n{notes}\n"));
    }
    prompt.push_str(
        "\nBased on this diagnosis, give practical advice covering:\n\
         1. Overview (2-3 sentences): what the disease is and its main symptoms\n\
         2. Immediate actions: first aid and how to stop it spreading\n\
         3. Treatment, step by step: chemical (name products where needed), organic and physical control\n\
         4. Prevention: long-term care, ventilation, humidity and watering\n\
         5. Precautions: what to be careful about and what to avoid\n\
         Keep it practical and explain technical terms simply.",
    );
    prompt
}

fn care_guide_prompt(plant_name: &str, language: &str) -> String {
    format!(
        "Plant: {plant_name}\n\n\
         Write an indoor pot care guide for '{plant_name}' that reflects its own traits and native habitat.\n\
         - watering: how often and how much, given whether it is a succulent or likes moisture\n\
         - sunlight: light needs based on its native environment\n\
         - temperature: the range it tolerates\n\
         - humidity: preferred humidity\n\
         - fertilizer: feeding schedule\n\
         - soil: the best potting mix for it\n\
         - tips: care points specific to this plant (pests, propagation, toxicity)\n\n\
         Write the values in {language} and focus on what is unique to '{plant_name}'.\n\
         Return only JSON in this shape:\n\
         {{\"watering\": \"...\", \"sunlight\": \"...\", \"temperature\": \"...\", \"humidity\": \"...\", \
         \"fertilizer\": \"...\", \"soil\": \"...\", \"tips\": [\"...\", \"...\", \"...\"]}}"
    )
}

/// Parse the JSON object embedded in a model answer (code fences and
/// surrounding prose are ignored)
fn parse_care_guide(answer: &str) -> Option<CareGuide> {
    let start = answer.find('{')?;
    let end = answer.rfind('}')?;
    if end < start {
        return None;
    }
    let parsed: CareGuideAnswer = serde_json::from_str(&answer[start..=end]).ok()?;
    Some(CareGuide {
        watering: parsed.watering,
        sunlight: parsed.sunlight,
        temperature: parsed.temperature,
        humidity: parsed.humidity,
        fertilizer: parsed.fertilizer,
        soil: parsed.soil,
        tips: parsed.tips,
    })
}
