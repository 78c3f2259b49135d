// Templated growth narratives and the LLM prompts that may replace them
use crate::domain::growth::{round1, PeriodUnit};
use crate::domain::plant::PlantIdentification;

/// Adverse conditions, ordered by how early in the plant's life they matter
pub const BAD_CONDITIONS: [&str; 7] = [
    "insufficient light (dark spot or too little sunlight)",
    "overwatering or drought (irregular watering)",
    "unsuitable temperature (too cold, too hot or sudden changes)",
    "low humidity (dry air)",
    "nutrient shortage (no fertilizer or poor soil)",
    "poor ventilation (closed space)",
    "wrong pot size (restricted root growth)",
];

const CARE_TIPS: [&str; 4] = [
    "Keep bright indirect light and water thoroughly once the soil is 60-70% dry.",
    "Keep the mix well draining (perlite or grit) and the air moving.",
    "Use diluted liquid fertilizer in small, regular doses during the growing season.",
    "Wipe dust off the leaves to keep photosynthesis efficient.",
];

const CARE_WARNINGS: [&str; 3] = [
    "Long hours of direct sun can scorch the leaves.",
    "Prolonged overwatering leads to root rot and mould spots.",
    "Avoid sudden temperature swings and cold drafts.",
];

/// Coarse life stage used to pick a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initial,
    EarlyGrowth,
    MidGrowth,
    Mature,
}

impl Stage {
    pub fn for_period(period: u32) -> Self {
        match period {
            0 => Stage::Initial,
            1..=3 => Stage::EarlyGrowth,
            4..=6 => Stage::MidGrowth,
            _ => Stage::Mature,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::EarlyGrowth => "early growth",
            Stage::MidGrowth => "mid growth",
            Stage::Mature => "mature",
        }
    }
}

/// Numbers a period narrative is written from
#[derive(Debug, Clone, Copy)]
pub struct PeriodFacts<'a> {
    pub plant_name: &'a str,
    pub period: u32,
    pub unit: PeriodUnit,
    pub good_size: f64,
    pub bad_size: f64,
}

impl PeriodFacts<'_> {
    pub fn stage(&self) -> Stage {
        Stage::for_period(self.period)
    }

    pub fn size_diff(&self) -> f64 {
        self.good_size - self.bad_size
    }

    fn when(&self) -> String {
        self.unit.describe(self.period)
    }
}

pub fn good_condition_analysis(facts: &PeriodFacts) -> String {
    let name = facts.plant_name;
    let size = facts.good_size;
    match facts.stage() {
        Stage::Initial => format!(
            "{name} is adapting well to optimal conditions. At {size}cm it is off to a healthy start, \
             and regular watering with steady temperature and humidity helps the roots settle. \
             Keep it out of direct sun in bright indirect light and water thoroughly once the soil is slightly dry. \
             Erring on the dry side rather than overwatering keeps the roots healthy."
        ),
        Stage::EarlyGrowth => format!(
            "At {when}, {name} is growing actively under optimal conditions. \
             At {size}cm it is growing about 30% faster than average thanks to good light, water and nutrients. \
             New leaves appear regularly and the root system is developing well. \
             Feed liquid fertilizer once or twice a month and mist the leaves to keep it thriving. \
             Place it somewhere well ventilated to prevent pests.",
            when = facts.when()
        ),
        Stage::MidGrowth => format!(
            "At {when}, {name} has entered a stable growth phase. \
             At {size}cm it shows what a plant grown under optimal conditions looks like. \
             Lush leaves and sturdy stems are typical, and regular pruning keeps the shape healthy. \
             Keep watering consistent and adjust temperature and humidity with the seasons. \
             Remove yellow leaves promptly so the plant can focus its energy on healthy growth.",
            when = facts.when()
        ),
        Stage::Mature => format!(
            "At {when}, {name} has reached maturity. \
             At {size}cm it shows the form of a mature plant grown under optimal conditions. \
             Long-term care matters now: repot every 2-3 years and keep up the feeding. \
             Growth slows at this stage, so water less often and respect winter dormancy. \
             Wipe the leaves regularly and catch pests early. \
             With proper care it can stay healthy for another 5-10 years or more.",
            when = facts.when()
        ),
    }
}

/// Adverse conditions that matter at this period: the first three early on,
/// five in mid growth and all of them once mature
pub fn adverse_conditions(period: u32) -> &'static [&'static str] {
    match period {
        0..=3 => &BAD_CONDITIONS[..3],
        4..=6 => &BAD_CONDITIONS[..5],
        _ => &BAD_CONDITIONS,
    }
}

pub fn bad_condition_description(facts: &PeriodFacts) -> String {
    format!(
        "At {when}, {name} is exposed to poor conditions. Main problems: {issues}. \
         At {size}cm it is growing about 30% slower than average as a result of environmental stress and inadequate care.",
        when = facts.when(),
        name = facts.plant_name,
        issues = adverse_conditions(facts.period).join(", "),
        size = facts.bad_size,
    )
}

pub fn bad_condition_impact(facts: &PeriodFacts) -> String {
    let name = facts.plant_name;
    match facts.stage() {
        Stage::Initial => format!(
            "If poor conditions persist during initial adaptation, root development of {name} is delayed and overall growth slows. \
             Leaves become smaller and paler and new growth may stop almost entirely. \
             Serious health problems can appear within 3-6 months, \
             and without timely improvement survival becomes difficult within 1-2 years."
        ),
        Stage::EarlyGrowth => format!(
            "If poor conditions continue at {when}, growth of {name} nearly stops \
             and existing leaves yellow or drop. It becomes vulnerable to root rot and pests \
             and may reach a state that is hard to recover from. Serious decline is expected within 6-12 months, \
             and without improvement survival becomes difficult within 1-3 years.",
            when = facts.when()
        ),
        Stage::MidGrowth => format!(
            "If poor conditions continue at {when}, {name} falls into chronic stress \
             and recovery becomes very hard. Leaves keep dropping, new growth is rare and overall vigour drops sharply. \
             Without corrective action survival becomes difficult within 1-2 years \
             and rapid decline is expected.",
            when = facts.when()
        ),
        Stage::Mature => format!(
            "At {when}, {name} has been exposed to poor conditions for a long time and its health is seriously degraded. \
             The chance of recovery is very low and immediate, fundamental changes in care are needed. \
             If this continues survival becomes difficult within 6-12 months, \
             and its lifespan shrinks to 30-50% of what normal conditions would allow. \
             Improve its environment right away and consider asking an expert.",
            when = facts.when()
        ),
    }
}

/// Prompt for the per-period summary written by the language model
pub fn period_summary_prompt(
    facts: &PeriodFacts,
    identification: Option<&PlantIdentification>,
    language: &str,
) -> String {
    let name = facts.plant_name;
    let mut plant_info = format!("Plant: {name}");
    if let Some(id) = identification {
        plant_info.push_str(&format!(
            "\nScientific name: {}",
            id.scientific_name.as_deref().unwrap_or("unknown")
        ));
        plant_info.push_str(&format!("\nConfidence: {:.1}%", id.confidence * 100.0));
        if !id.common_names.is_empty() {
            let names: Vec<&str> = id.common_names.iter().take(3).map(String::as_str).collect();
            plant_info.push_str(&format!("\nCommon names: {}", names.join(", ")));
        }
    }

    let when = facts.when();
    let stage = facts.stage().label();
    format!(
        "{plant_info}\n\n\
         Expected growth {when} from now:\n\
         - with good care: up to {good:.1}cm\n\
         - with poor care: up to {bad:.1}cm\n\
         - growth stage: {stage}\n\
         - difference between the two: {diff:.1}cm\n\n\
         Using the information above, write in {language}:\n\
         1. an overall explanation of the growth outlook for {name} after {when}\n\
         2. what the two lines of the graph (good / poor care) mean\n\
         3. concrete care advice for the {stage} stage\n\
         4. conditions to avoid and precautions\n\
         5. keep it practical and realistic (3-5 sentences)",
        good = facts.good_size,
        bad = facts.bad_size,
        diff = facts.size_diff(),
    )
}

pub fn period_summary_fallback(facts: &PeriodFacts) -> String {
    format!(
        "{name} is in the {stage} stage. After {when} it is expected to reach \
         {good:.1}cm with good care and {bad:.1}cm with poor care.\n\n\
         For optimal growth give it plenty of indirect light, water when the soil surface is dry, \
         and keep the temperature at 18-24°C with 40-60% humidity.\n\n\
         Avoid direct sun, waterlogging or drought, sudden temperature changes and poor ventilation. \
         If these persist growth can lag by {diff:.1}cm or more and the plant's long-term health suffers.",
        name = facts.plant_name,
        stage = facts.stage().label(),
        when = facts.when(),
        good = facts.good_size,
        bad = facts.bad_size,
        diff = facts.size_diff(),
    )
}

/// Whole-graph data the comprehensive analysis is written from
#[derive(Debug, Clone)]
pub struct SeriesSummary<'a> {
    pub plant_name: &'a str,
    pub ceiling: f64,
    pub start_size: f64,
    pub unit: PeriodUnit,
    pub periods: u32,
    pub good_series: &'a [f64],
    pub bad_series: &'a [f64],
}

fn average(series: &[f64]) -> f64 {
    round1(series.iter().sum::<f64>() / series.len().max(1) as f64)
}

fn bullets(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_series(series: &[f64]) -> String {
    let values: Vec<String> = series.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(", "))
}

pub fn plant_analysis_prompt(summary: &SeriesSummary, language: &str) -> String {
    let name = summary.plant_name;
    format!(
        "Using the data below (plant name, growth scenarios), write 8-12 sentences in {language}: \
         a summary of the growth trend of {name}, 4 care tips and 3 warnings as bullets.\n\
         - Plant: {name}\n\
         - Unit: {unit}, periods: {periods}\n\
         - Starting height: {start} cm\n\
         - Estimated ceiling (K): {ceiling} cm\n\
         - Good growth series: {good}\n\
         - Poor growth series: {bad}\n\
         Keep it short and practical, skip filler words and do not repeat facts.\n\
         Use the section titles 'Summary', 'Care tips' and 'Watch out for'.",
        unit = summary.unit,
        periods = summary.periods,
        start = summary.start_size,
        ceiling = summary.ceiling,
        good = format_series(summary.good_series),
        bad = format_series(summary.bad_series),
    )
}

pub fn plant_analysis_fallback(summary: &SeriesSummary) -> String {
    let name = summary.plant_name;
    format!(
        "Summary\n\
         - Plant: {name} / estimated ceiling (K): {ceiling} cm / starting height: {start} cm\n\
         - Span: {span} / unit: {unit}\n\
         - Average with good care: {good} cm, average with poor care: {bad} cm\n\
         - Overall {name} shows steady growth, with differences depending on care.\n\n\
         Care tips\n{tips}\n\n\
         Watch out for\n{warnings}",
        ceiling = summary.ceiling,
        start = summary.start_size,
        span = summary.unit.describe(summary.periods),
        unit = summary.unit,
        good = average(summary.good_series),
        bad = average(summary.bad_series),
        tips = bullets(&CARE_TIPS),
        warnings = bullets(&CARE_WARNINGS),
    )
}

/// One-line outlook shown above the growth graph
pub fn growth_outlook(
    plant_name: &str,
    unit: PeriodUnit,
    periods: u32,
    start_size: f64,
    max_size: f64,
) -> String {
    format!(
        "{plant_name} over {span}: can grow from {start_size:.1}cm up to {max_size:.1}cm.",
        span = unit.describe(periods)
    )
}
