// Plant identification and care domain models
use serde::{Deserialize, Serialize};

/// Name used for care guides when the species could not be identified
pub const GENERIC_PLANT_NAME: &str = "Common houseplant";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantIdentification {
    pub plant_name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub common_names: Vec<String>,
}

impl PlantIdentification {
    /// Neutral result returned when every classifier failed
    pub fn unidentified() -> Self {
        Self {
            plant_name: "Unidentified plant".to_string(),
            scientific_name: None,
            confidence: 0.5,
            common_names: vec![
                "Houseplant".to_string(),
                "Foliage plant".to_string(),
                "Flowering plant".to_string(),
            ],
        }
    }

    /// Placeholder used when a growth analysis is requested for a plant
    /// that has no stored identification
    pub fn assumed(plant_name: &str) -> Self {
        Self {
            plant_name: plant_name.to_string(),
            scientific_name: None,
            confidence: 0.5,
            common_names: Vec::new(),
        }
    }
}

/// Convert a model label such as "snake_plant-variegated" into "Snake Plant Variegated"
pub fn format_plant_name(label: &str) -> String {
    label
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareGuide {
    pub watering: String,
    pub sunlight: String,
    pub temperature: String,
    pub humidity: String,
    pub fertilizer: String,
    pub soil: String,
    pub tips: Vec<String>,
}

impl CareGuide {
    pub fn default_for(plant_name: &str) -> Self {
        Self {
            watering: format!(
                "Water {} once or twice a week. Water thoroughly when the soil surface is dry.",
                plant_name
            ),
            sunlight: format!(
                "{} prefers bright, indirect light. Avoid direct sunlight.",
                plant_name
            ),
            temperature: "An indoor temperature of 18-24°C is ideal. Avoid sudden temperature changes."
                .to_string(),
            humidity: "Keep humidity moderate (40-60%). Mist the leaves when the air is dry."
                .to_string(),
            fertilizer: "Feed liquid fertilizer once or twice a month in the growing season (spring-summer) and once a month while dormant (autumn-winter)."
                .to_string(),
            soil: "Use a well-draining potting mix. Adding perlite or sand improves drainage."
                .to_string(),
            tips: vec![
                "Avoid overwatering and use a pot with drainage holes".to_string(),
                "Wipe dust off the leaves regularly to help photosynthesis".to_string(),
                "Keep the plant in a well-ventilated spot to prevent pests".to_string(),
            ],
        }
    }

    /// Fill blank sections from the default guide
    pub fn or_defaults(mut self, plant_name: &str) -> Self {
        let fallback = Self::default_for(plant_name);
        for (field, default) in [
            (&mut self.watering, fallback.watering),
            (&mut self.sunlight, fallback.sunlight),
            (&mut self.temperature, fallback.temperature),
            (&mut self.humidity, fallback.humidity),
            (&mut self.fertilizer, fallback.fertilizer),
            (&mut self.soil, fallback.soil),
        ] {
            if field.trim().is_empty() {
                *field = default;
            }
        }
        if self.tips.is_empty() {
            self.tips = fallback.tips;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthStage {
    pub stage: String,
    pub timeframe: String,
    pub image_url: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPrediction {
    pub stages: Vec<GrowthStage>,
}

impl GrowthPrediction {
    /// Thirteen stages, from now to twelve months out
    pub fn default_for(plant_name: &str) -> Self {
        let stages = (0..=12)
            .map(|month| {
                let (stage, timeframe) = if month == 0 {
                    ("current".to_string(), "Now".to_string())
                } else if month == 1 {
                    ("1_months".to_string(), "1 month".to_string())
                } else {
                    (format!("{}_months", month), format!("{} months", month))
                };
                GrowthStage {
                    stage,
                    timeframe,
                    image_url: None,
                    description: stage_description(plant_name, month),
                }
            })
            .collect();

        Self { stages }
    }
}

fn stage_description(plant_name: &str, month: u32) -> String {
    match month {
        0 => format!(
            "{} is at its initial stage and adapting to a new environment.",
            plant_name
        ),
        1 => format!("{} is starting to adapt to its new environment.", plant_name),
        2 => "New leaves begin to appear as the roots settle in.".to_string(),
        3 => "Early growth is progressing steadily.".to_string(),
        4 => "Foliage fills out and the root system develops.".to_string(),
        5 => "Growth is vigorous and new branches start to appear.".to_string(),
        6 => "A mature look with lush leaves and healthy stems.".to_string(),
        7 => "The growth pattern is fully stabilized.".to_string(),
        8 => "The plant keeps growing while staying in optimal condition.".to_string(),
        9 => "Dense foliage and a healthy appearance.".to_string(),
        10 => "Fully established as a mature plant.".to_string(),
        11 => "Fully grown; long-term care becomes the focus.".to_string(),
        12 => format!("The final, fully grown form of {}.", plant_name),
        _ => format!("{} is growing healthily.", plant_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plant_name() {
        assert_eq!(format_plant_name("snake_plant"), "Snake Plant");
        assert_eq!(format_plant_name("aloe-vera"), "Aloe Vera");
        assert_eq!(format_plant_name("MONSTERA  deliciosa"), "Monstera Deliciosa");
        assert_eq!(format_plant_name(""), "");
    }

    #[test]
    fn test_default_prediction_has_thirteen_stages() {
        let prediction = GrowthPrediction::default_for("Pothos");
        assert_eq!(prediction.stages.len(), 13);
        assert_eq!(prediction.stages[0].stage, "current");
        assert_eq!(prediction.stages[12].timeframe, "12 months");
        assert!(prediction.stages[12].description.contains("Pothos"));
        assert!(prediction.stages.iter().all(|s| s.image_url.is_none()));
    }

    #[test]
    fn test_care_guide_blank_fields_are_filled() {
        let partial = CareGuide {
            watering: "Keep moist".to_string(),
            sunlight: String::new(),
            temperature: " ".to_string(),
            humidity: "High".to_string(),
            fertilizer: String::new(),
            soil: "Peat".to_string(),
            tips: Vec::new(),
        };
        let guide = partial.or_defaults("Fern");
        assert_eq!(guide.watering, "Keep moist");
        assert!(guide.sunlight.contains("Fern"));
        assert!(!guide.temperature.trim().is_empty());
        assert!(!guide.fertilizer.is_empty());
        assert_eq!(guide.tips.len(), 3);
    }
}
