// Growth projection domain models - deterministic logistic growth curves
use crate::domain::error::ValidationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Growth-rate multiplier for the optimistic (well cared for) scenario
pub const GOOD_MULTIPLIER: f64 = 1.3;
/// Growth-rate multiplier for the pessimistic (neglected) scenario
pub const BAD_MULTIPLIER: f64 = 0.7;

/// Upper bound accepted for `max_periods` (ten years of weeks)
pub const MAX_PERIODS: u32 = 520;

/// Weekly graphs never carry more than this many sampled periods (plus the final one)
const MAX_WEEKLY_SAMPLES: u32 = 12;
/// Weekly periods are rescaled onto this reference window before the logistic step
const WEEKLY_REFERENCE_WINDOW: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Week,
    Month,
}

impl PeriodUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodUnit::Week => "week",
            PeriodUnit::Month => "month",
        }
    }

    /// "1 month", "3 weeks", ...
    pub fn describe(&self, period: u32) -> String {
        let unit = self.as_str();
        if period == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", period, unit)
        }
    }

    /// Label used by the tabular views: "Now" for the starting point
    pub fn period_label(&self, period: u32) -> String {
        if period == 0 {
            "Now".to_string()
        } else {
            self.describe(period)
        }
    }
}

impl fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(PeriodUnit::Week),
            "month" => Ok(PeriodUnit::Month),
            other => Err(ValidationError::InvalidPeriodUnit(other.to_string())),
        }
    }
}

pub fn validate_max_periods(value: u32) -> Result<u32, ValidationError> {
    if (1..=MAX_PERIODS).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::PeriodsOutOfRange {
            value,
            limit: MAX_PERIODS,
        })
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Map a plant name onto a stable scalar in [0, 1].
///
/// The first four bytes of the SHA-256 digest are read as a big-endian
/// integer and normalized by `u32::MAX`, so the same name always produces
/// the same curves without any stored state.
pub fn seed_from_name(plant_name: &str) -> f64 {
    let digest = Sha256::digest(plant_name.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (prefix as f64 / u32::MAX as f64).clamp(0.0, 1.0)
}

/// Coarse plant size class selected from the seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn from_seed(seed: f64) -> Self {
        match ((seed * 1000.0).floor() as u64) % 3 {
            0 => SizeClass::Small,
            1 => SizeClass::Medium,
            _ => SizeClass::Large,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub initial_size: f64,
    pub max_size: f64,
}

impl SizeRange {
    /// Estimate the (initial, max) size envelope in centimeters.
    ///
    /// A classification confidence, when known, scales both bounds by
    /// `0.8 + 0.2 * confidence`. Results always satisfy
    /// `initial_size >= 3.0` and `max_size >= 2 * initial_size`.
    pub fn estimate(plant_name: &str, confidence: Option<f64>) -> Self {
        let seed = seed_from_name(plant_name);
        let factor = confidence_factor(confidence);

        let (initial, max) = match SizeClass::from_seed(seed) {
            SizeClass::Small => (5.0 + seed * 5.0, 20.0 + seed * 10.0),
            SizeClass::Medium => (8.0 + seed * 7.0, 40.0 + seed * 20.0),
            SizeClass::Large => (15.0 + seed * 10.0, 80.0 + seed * 70.0),
        };

        // Clamp after rounding so the published values keep the invariants.
        let initial_size = round1((initial * factor).max(3.0));
        let max_size = round1(max * factor).max(initial_size * 2.0);

        Self {
            initial_size,
            max_size,
        }
    }
}

pub fn confidence_factor(confidence: Option<f64>) -> f64 {
    match confidence {
        Some(c) => 0.8 + c.clamp(0.0, 1.0) * 0.2,
        None => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub period: u32,
    pub size: f64,
}

/// Period list for a graph: every month, or at most 12 evenly spaced weeks
/// plus the final week. Rounding the step up keeps `max_periods / step`
/// at or below the sample count.
pub fn sample_periods(unit: PeriodUnit, max_periods: u32) -> Vec<u32> {
    match unit {
        PeriodUnit::Month => (0..=max_periods).collect(),
        PeriodUnit::Week => {
            let step = max_periods.div_ceil(MAX_WEEKLY_SAMPLES).max(1) as usize;
            let mut periods: Vec<u32> = (0..=max_periods).step_by(step).collect();
            if periods.last() != Some(&max_periods) {
                periods.push(max_periods);
            }
            periods
        }
    }
}

/// Logistic growth curve between the bounds of a size range
#[derive(Debug, Clone, Copy)]
pub struct GrowthCurve {
    range: SizeRange,
    seed: f64,
    unit: PeriodUnit,
    max_period: u32,
}

impl GrowthCurve {
    pub fn new(range: SizeRange, seed: f64, unit: PeriodUnit, max_period: u32) -> Self {
        Self {
            range,
            seed,
            unit,
            max_period,
        }
    }

    /// Steepness `k` and inflection point `x0` for a multiplier
    fn shape(&self, multiplier: f64) -> (f64, f64) {
        let s = self.seed;
        match self.unit {
            PeriodUnit::Week => ((0.15 + 0.1 * s) * multiplier, (8.0 - 4.0 * s) * multiplier),
            PeriodUnit::Month => ((0.35 + 0.2 * s) * multiplier, (3.0 - 1.5 * s) * multiplier),
        }
    }

    fn normalize(&self, period: u32) -> f64 {
        match self.unit {
            PeriodUnit::Month => period as f64,
            PeriodUnit::Week if self.max_period == 0 => 0.0,
            PeriodUnit::Week => period as f64 / self.max_period as f64 * WEEKLY_REFERENCE_WINDOW,
        }
    }

    pub fn point(&self, period: u32, multiplier: f64) -> GrowthPoint {
        let (k, x0) = self.shape(multiplier);
        let x = self.normalize(period);
        let growth_index = 1.0 / (1.0 + (-k * (x - x0)).exp());

        let SizeRange {
            initial_size,
            max_size,
        } = self.range;
        let mut size = initial_size + (max_size - initial_size) * growth_index;
        size += (self.seed * 0.1 - 0.05) * size;
        let size = size.clamp(initial_size * 0.8, max_size * 1.1);

        GrowthPoint {
            period,
            size: round1(size),
        }
    }

    pub fn points(&self, periods: &[u32], multiplier: f64) -> Vec<GrowthPoint> {
        periods.iter().map(|&p| self.point(p, multiplier)).collect()
    }
}

/// Numeric part of a growth graph: both scenarios plus display bounds
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthProjection {
    pub range: SizeRange,
    pub periods: Vec<u32>,
    pub good_growth: Vec<GrowthPoint>,
    pub bad_growth: Vec<GrowthPoint>,
    pub min_size: f64,
    pub max_size: f64,
}

impl GrowthProjection {
    pub fn compute(
        plant_name: &str,
        unit: PeriodUnit,
        max_periods: u32,
        confidence: Option<f64>,
    ) -> Self {
        let seed = seed_from_name(plant_name);
        let range = SizeRange::estimate(plant_name, confidence);
        let periods = sample_periods(unit, max_periods);
        let curve = GrowthCurve::new(range, seed, unit, max_periods);

        let good_growth = curve.points(&periods, GOOD_MULTIPLIER);
        let bad_growth = curve.points(&periods, BAD_MULTIPLIER);

        Self {
            range,
            periods,
            good_growth,
            bad_growth,
            min_size: round1((range.initial_size * 0.9).max(0.0)),
            max_size: round1(range.max_size * 1.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAnalysis {
    pub period: u32,
    pub good_condition_analysis: String,
    pub bad_condition_description: String,
    pub bad_condition_impact: String,
    pub llm_comprehensive_analysis: String,
    pub layout_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub good_growth_color: String,
    pub bad_growth_color: String,
    pub show_two_lines: bool,
    pub chart_type: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            good_growth_color: "#22c55e".to_string(),
            bad_growth_color: "#ef4444".to_string(),
            show_two_lines: true,
            chart_type: "line".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthGraph {
    pub good_growth: Vec<GrowthPoint>,
    pub bad_growth: Vec<GrowthPoint>,
    pub period_unit: PeriodUnit,
    pub plant_name: String,
    pub min_size: f64,
    pub max_size: f64,
    pub period_analyses: Vec<PeriodAnalysis>,
    pub note: String,
    pub graph_config: GraphConfig,
}

impl GrowthGraph {
    pub fn assemble(
        plant_name: &str,
        unit: PeriodUnit,
        projection: GrowthProjection,
        period_analyses: Vec<PeriodAnalysis>,
    ) -> Self {
        Self {
            good_growth: projection.good_growth,
            bad_growth: projection.bad_growth,
            period_unit: unit,
            plant_name: plant_name.to_string(),
            min_size: projection.min_size,
            max_size: projection.max_size,
            period_analyses,
            note: format!(
                "Growth graph for {}. Compare good growth (optimal care) with bad growth (neglected care).",
                plant_name
            ),
            graph_config: GraphConfig::default(),
        }
    }

    pub fn good_series(&self) -> Vec<f64> {
        self.good_growth.iter().map(|p| p.size).collect()
    }

    pub fn bad_series(&self) -> Vec<f64> {
        self.bad_growth.iter().map(|p| p.size).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDataRow {
    pub period: String,
    pub expected_height: f64,
    pub good_condition_height: Option<f64>,
    pub bad_condition_height: Option<f64>,
}

/// Table rows for a graph; expected height is the mean of both scenarios
pub fn monthly_rows(graph: &GrowthGraph) -> Vec<MonthlyDataRow> {
    graph
        .good_growth
        .iter()
        .enumerate()
        .map(|(i, good)| {
            let bad = graph.bad_growth.get(i).unwrap_or(good);
            MonthlyDataRow {
                period: graph.period_unit.period_label(good.period),
                expected_height: round1((good.size + bad.size) / 2.0),
                good_condition_height: Some(round1(good.size)),
                bad_condition_height: Some(round1(bad.size)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    #[test]
    fn test_seed_is_stable_and_in_range() {
        let a = seed_from_name("Monstera Deliciosa");
        let b = seed_from_name("Monstera Deliciosa");
        assert_eq!(a.to_bits(), b.to_bits());
        assert!((0.0..=1.0).contains(&a));
        assert_ne!(a, seed_from_name("Monstera deliciosa"));
    }

    #[test]
    fn test_period_unit_parsing() {
        assert_eq!("week".parse::<PeriodUnit>(), Ok(PeriodUnit::Week));
        assert_eq!("month".parse::<PeriodUnit>(), Ok(PeriodUnit::Month));
        assert_eq!(
            "year".parse::<PeriodUnit>(),
            Err(ValidationError::InvalidPeriodUnit("year".to_string()))
        );
    }

    #[test]
    fn test_size_range_envelope_for_random_names() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let len = rng.gen_range(0..24);
            let name: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect();
            let confidence = if rng.gen_bool(0.5) {
                Some(rng.gen_range(0.0..=1.0))
            } else {
                None
            };

            let range = SizeRange::estimate(&name, confidence);
            assert!(range.initial_size >= 3.0, "{name}: {range:?}");
            assert!(range.max_size >= 2.0 * range.initial_size, "{name}: {range:?}");
        }
    }

    #[test]
    fn test_confidence_only_scales_the_range() {
        let high = SizeRange::estimate("Cactus X", Some(0.9));
        let low = SizeRange::estimate("Cactus X", Some(0.1));
        let seed = seed_from_name("Cactus X");
        let class = SizeClass::from_seed(seed);

        let (initial, max) = match class {
            SizeClass::Small => (5.0 + seed * 5.0, 20.0 + seed * 10.0),
            SizeClass::Medium => (8.0 + seed * 7.0, 40.0 + seed * 20.0),
            SizeClass::Large => (15.0 + seed * 10.0, 80.0 + seed * 70.0),
        };
        for (range, c) in [(high, 0.9), (low, 0.1)] {
            let f = confidence_factor(Some(c));
            let expected_initial = round1((initial * f).max(3.0));
            let expected_max = round1(max * f).max(expected_initial * 2.0);
            assert_eq!(range.initial_size, expected_initial);
            assert_eq!(range.max_size, expected_max);
        }
        assert!(high.max_size > low.max_size);
    }

    #[test]
    fn test_monthly_periods() {
        assert_eq!(sample_periods(PeriodUnit::Month, 12), (0..=12).collect::<Vec<_>>());
        assert_eq!(sample_periods(PeriodUnit::Month, 0), vec![0]);
    }

    #[test]
    fn test_weekly_periods_are_capped_and_end_on_max() {
        let periods = sample_periods(PeriodUnit::Week, 24);
        assert!(periods.len() <= 13);
        assert_eq!(periods.last(), Some(&24));
        assert_eq!(periods[..3], [0, 2, 4]);

        assert_eq!(sample_periods(PeriodUnit::Week, 23).len(), 13);
        assert_eq!(sample_periods(PeriodUnit::Week, 25), vec![0, 3, 6, 9, 12, 15, 18, 21, 24, 25]);
        assert_eq!(sample_periods(PeriodUnit::Week, 5), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(sample_periods(PeriodUnit::Week, 0), vec![0]);
    }

    #[test]
    fn test_weekly_cap_holds_for_every_allowed_length() {
        for max_periods in 1..=MAX_PERIODS {
            let periods = sample_periods(PeriodUnit::Week, max_periods);
            assert!(
                periods.len() <= MAX_WEEKLY_SAMPLES as usize + 1,
                "{max_periods} weeks produced {} points",
                periods.len()
            );
            assert_eq!(periods.first(), Some(&0));
            assert_eq!(periods.last(), Some(&max_periods));
            assert!(periods.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_projection_bounds_and_alignment() {
        for unit in [PeriodUnit::Week, PeriodUnit::Month] {
            for name in ["Monstera Deliciosa", "Ficus", "Cactus X", "", "산세베리아"] {
                let projection = GrowthProjection::compute(name, unit, 24, Some(0.7));
                let range = projection.range;
                assert_eq!(projection.good_growth.len(), projection.periods.len());
                assert_eq!(projection.bad_growth.len(), projection.periods.len());

                for (i, period) in projection.periods.iter().enumerate() {
                    assert_eq!(projection.good_growth[i].period, *period);
                    assert_eq!(projection.bad_growth[i].period, *period);
                    for point in [projection.good_growth[i], projection.bad_growth[i]] {
                        assert!(point.size >= round1(range.initial_size * 0.8) - 0.05);
                        assert!(point.size <= round1(range.max_size * 1.1) + 0.05);
                    }
                }
            }
        }
    }

    #[test]
    fn test_weekly_projection_with_zero_periods() {
        let projection = GrowthProjection::compute("Pothos", PeriodUnit::Week, 0, None);
        assert_eq!(projection.periods, vec![0]);
        assert!(projection.good_growth[0].size.is_finite());
    }

    #[test]
    fn test_display_bounds() {
        let projection = GrowthProjection::compute("Monstera Deliciosa", PeriodUnit::Month, 12, None);
        assert_eq!(projection.min_size, round1(projection.range.initial_size * 0.9));
        assert_eq!(projection.max_size, round1(projection.range.max_size * 1.1));
    }

    #[test]
    fn test_good_growth_eventually_leads() {
        // The two curves share one envelope and may cross early on; by the end
        // of a year the faster curve is ahead or saturated at the same size.
        let projection = GrowthProjection::compute("Monstera Deliciosa", PeriodUnit::Month, 12, None);
        let last = projection.periods.len() - 1;
        assert!(projection.good_growth[last].size >= projection.bad_growth[last].size);
    }

    #[test]
    fn test_curves_cross_at_the_start() {
        // good >= bad is not an invariant. x0 scales with the multiplier, so the
        // optimistic curve has a later inflection point and starts below the
        // pessimistic one in monthly mode.
        for name in ["Monstera Deliciosa", "Ficus", "Cactus X"] {
            let projection = GrowthProjection::compute(name, PeriodUnit::Month, 12, None);
            assert!(
                projection.good_growth[0].size < projection.bad_growth[0].size,
                "{name}: {:?} vs {:?}",
                projection.good_growth[0],
                projection.bad_growth[0]
            );
        }
    }

    #[test]
    fn test_max_periods_validation() {
        assert_eq!(validate_max_periods(12), Ok(12));
        assert_eq!(validate_max_periods(MAX_PERIODS), Ok(MAX_PERIODS));
        assert!(validate_max_periods(0).is_err());
        assert_eq!(
            validate_max_periods(MAX_PERIODS + 1),
            Err(ValidationError::PeriodsOutOfRange {
                value: MAX_PERIODS + 1,
                limit: MAX_PERIODS
            })
        );
    }

    #[test]
    fn test_period_labels() {
        assert_eq!(PeriodUnit::Month.period_label(0), "Now");
        assert_eq!(PeriodUnit::Month.period_label(1), "1 month");
        assert_eq!(PeriodUnit::Week.period_label(6), "6 weeks");
    }
}
