// Disease detection domain models - confidence tiers and class-name parsing
use serde::{Deserialize, Serialize};

/// At or above this confidence a detection is trusted enough for treatment advice
pub const HIGH_CONFIDENCE: f64 = 0.55;
/// At or above this confidence the top detection is reported as a likely match
pub const MEDIUM_CONFIDENCE: f64 = 0.20;

const DISEASE_KEYWORDS: [&str; 18] = [
    "scab",
    "spot",
    "blight",
    "rot",
    "mold",
    "mildew",
    "rust",
    "wilt",
    "mosaic",
    "curl",
    "virus",
    "bacterial",
    "fungal",
    "leaf",
    "healthy",
    "disease",
    "canker",
    "anthracnose",
];

const HEALTHY_KEYWORDS: [&str; 2] = ["healthy", "normal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisStatus {
    NoDetection,
    LowConfidence,
    MediumConfidence,
    HighConfidence,
}

impl DiagnosisStatus {
    pub fn from_confidence(max_confidence: f64) -> Self {
        if max_confidence >= HIGH_CONFIDENCE {
            DiagnosisStatus::HighConfidence
        } else if max_confidence >= MEDIUM_CONFIDENCE {
            DiagnosisStatus::MediumConfidence
        } else {
            DiagnosisStatus::LowConfidence
        }
    }
}

/// Detection as reported by the detector service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDetection {
    pub class_name: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Disease part of the class name
    pub name: String,
    pub full_name: String,
    pub species: String,
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in pixels
    pub bbox: [f64; 4],
}

impl Detection {
    pub fn from_raw(raw: RawDetection) -> Self {
        let (species, name) = parse_class_name(&raw.class_name);
        Self {
            name,
            full_name: raw.class_name,
            species,
            confidence: raw.confidence,
            bbox: raw.bbox,
        }
    }

    pub fn is_healthy(&self) -> bool {
        is_healthy(&self.name)
    }
}

/// Split a detector class name into `(species, disease)`.
///
/// The disease part starts at the first word containing a disease keyword:
/// "Corn Gray leaf spot" becomes ("Corn Gray", "leaf spot"). When the very
/// first word matches, the first word is still taken as the species.
pub fn parse_class_name(class_name: &str) -> (String, String) {
    let words: Vec<&str> = class_name.split_whitespace().collect();
    let split_index = words.iter().position(|word| {
        let lower = word.to_lowercase();
        DISEASE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
    });

    match split_index {
        Some(0) => {
            let species = words.first().map(|w| w.to_string()).unwrap_or_default();
            let disease = if words.len() > 1 {
                words[1..].join(" ")
            } else {
                "Unknown".to_string()
            };
            (species, disease)
        }
        Some(i) => (words[..i].join(" "), words[i..].join(" ")),
        None => (class_name.to_string(), "Normal".to_string()),
    }
}

pub fn is_healthy(name: &str) -> bool {
    let lower = name.to_lowercase();
    HEALTHY_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub status: DiagnosisStatus,
    pub max_confidence: f64,
    /// Number of raw detections before filtering
    pub detection_count: usize,
    pub species: Option<String>,
    pub species_confidence: f64,
    /// Sorted by confidence, highest first
    pub detections: Vec<Detection>,
}

impl DiagnosisReport {
    /// Sort detections and bucket the result by its best confidence.
    ///
    /// With `filter` set only the top detection is kept. Without it every
    /// detection is returned and the status stays `NoDetection`, matching
    /// the unfiltered mode of the detector.
    pub fn classify(raw: Vec<RawDetection>, filter: bool) -> Self {
        let detection_count = raw.len();
        let mut detections: Vec<Detection> = raw.into_iter().map(Detection::from_raw).collect();
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let Some(top) = detections.first() else {
            return Self {
                status: DiagnosisStatus::NoDetection,
                max_confidence: 0.0,
                detection_count,
                species: None,
                species_confidence: 0.0,
                detections,
            };
        };

        let max_confidence = top.confidence;
        let species = Some(top.species.clone());
        let status = if filter {
            detections.truncate(1);
            DiagnosisStatus::from_confidence(max_confidence)
        } else {
            DiagnosisStatus::NoDetection
        };

        Self {
            status,
            max_confidence,
            detection_count,
            species,
            species_confidence: max_confidence,
            detections,
        }
    }

    pub fn top(&self) -> Option<&Detection> {
        self.detections.first()
    }
}

pub fn high_confidence_message() -> String {
    "Diagnosis complete.".to_string()
}

pub fn medium_confidence_message(species: &str, disease: &str, max_confidence: f64) -> String {
    format!(
        "An exact diagnosis is difficult. {disease} on {species} is the most likely match ({:.1}%). \
         Please try again with a sharper photo.",
        max_confidence * 100.0
    )
}

pub fn no_detection_message() -> String {
    "No plant leaves were detected. Please retake the photo so the leaves are clearly visible."
        .to_string()
}
