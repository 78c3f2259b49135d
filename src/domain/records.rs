// Persisted records - growth logs and saved identifications
use crate::domain::error::ValidationError;
use crate::domain::plant::PlantIdentification;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days projected ahead by the growth log view
pub const PROJECTION_DAYS: u32 = 7;
/// Assumed daily growth of the naive projection, in cm
const DAILY_GROWTH_CM: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecord {
    pub date: String,
    pub height: f64,
}

impl GrowthRecord {
    pub fn new(date: impl Into<String>, height: f64) -> Self {
        Self {
            date: date.into(),
            height,
        }
    }
}

/// Date format of growth records; zero padded so string order is date order
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Check a growth log entry submitted by a client and return its date in
/// canonical `YYYY-MM-DD` form
pub fn validate_growth_entry(plant_id: &str, date: &str, height: f64) -> Result<String, ValidationError> {
    if plant_id.trim().is_empty() {
        return Err(ValidationError::MissingField("plant_id"));
    }
    let date = date.trim();
    if date.is_empty() {
        return Err(ValidationError::MissingField("date"));
    }
    let parsed = NaiveDate::parse_from_str(date, RECORD_DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidField {
            field: "date",
            reason: format!("expected YYYY-MM-DD, got '{date}'"),
        }
    })?;
    if !height.is_finite() || height < 0.0 {
        return Err(ValidationError::InvalidField {
            field: "height",
            reason: format!("expected a non-negative number, got {height}"),
        });
    }
    Ok(parsed.format(RECORD_DATE_FORMAT).to_string())
}

/// Insert a record, or update the height of the record with the same date.
/// The list stays sorted by date.
pub fn upsert_record(records: &mut Vec<GrowthRecord>, record: GrowthRecord) {
    match records.iter_mut().find(|r| r.date == record.date) {
        Some(existing) => existing.height = record.height,
        None => {
            records.push(record);
            records.sort_by(|a, b| a.date.cmp(&b.date));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationRecord {
    pub id: String,
    pub timestamp: String,
    pub file_hash: Option<String>,
    pub identification: PlantIdentification,
}

impl IdentificationRecord {
    pub fn new(
        identification: PlantIdentification,
        file_hash: Option<String>,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            id: format!(
                "{}_{}",
                identification.plant_name,
                now.format("%Y%m%d%H%M%S")
            ),
            timestamp: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            file_hash,
            identification,
        }
    }
}

/// Newest saved identification for a plant name
pub fn newest_for<'a>(
    records: impl IntoIterator<Item = &'a IdentificationRecord>,
    plant_name: &str,
) -> Option<&'a IdentificationRecord> {
    records
        .into_iter()
        .filter(|r| r.identification.plant_name == plant_name)
        .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedHeight {
    pub date: String,
    pub height: f64,
}

/// Linear projection from the last record, one step per day
pub fn naive_projection(history: &[GrowthRecord]) -> Vec<ProjectedHeight> {
    let Some(last) = history.last() else {
        return Vec::new();
    };
    (1..=PROJECTION_DAYS)
        .map(|day| ProjectedHeight {
            date: format!("forecast+{}d", day),
            height: last.height + day as f64 * DAILY_GROWTH_CM,
        })
        .collect()
}

/// Compare the last two records; "-" when there is nothing to compare
pub fn comparison_comment(history: &[GrowthRecord]) -> String {
    match history {
        [.., previous, last] => {
            let delta = last.height - previous.height;
            let direction = if delta > 0.0 { "increase" } else { "decrease" };
            format!(
                "{}cm {} compared with the previous record",
                (delta * 100.0).round() / 100.0,
                direction
            )
        }
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_growth_entry_validation() {
        assert_eq!(
            validate_growth_entry("pothos-1", " 2024-05-01 ", 12.0),
            Ok("2024-05-01".to_string())
        );
        assert_eq!(
            validate_growth_entry(" ", "2024-05-01", 12.0),
            Err(ValidationError::MissingField("plant_id"))
        );
        assert_eq!(
            validate_growth_entry("pothos-1", "", 12.0),
            Err(ValidationError::MissingField("date"))
        );
        assert!(validate_growth_entry("pothos-1", "2024-05-01", -1.0).is_err());
        assert!(validate_growth_entry("pothos-1", "2024-05-01", f64::NAN).is_err());
    }

    #[test]
    fn test_growth_dates_are_canonical() {
        let loose = validate_growth_entry("pothos-1", "2024-5-1", 12.0).unwrap();
        assert_eq!(loose, "2024-05-01");
        assert!(loose < "2024-05-02".to_string());

        for bad in ["01/05/2024", "2024-13-01", "2024-02-30", "yesterday"] {
            assert!(matches!(
                validate_growth_entry("pothos-1", bad, 12.0),
                Err(ValidationError::InvalidField { field: "date", .. })
            ));
        }
    }

    #[test]
    fn test_upsert_updates_same_date() {
        let mut records = vec![GrowthRecord::new("2024-05-01", 10.0)];
        upsert_record(&mut records, GrowthRecord::new("2024-05-01", 12.5));
        assert_eq!(records, vec![GrowthRecord::new("2024-05-01", 12.5)]);
    }

    #[test]
    fn test_upsert_keeps_date_order() {
        let mut records = Vec::new();
        upsert_record(&mut records, GrowthRecord::new("2024-05-03", 13.0));
        upsert_record(&mut records, GrowthRecord::new("2024-05-01", 10.0));
        upsert_record(&mut records, GrowthRecord::new("2024-05-02", 11.0));
        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-05-01", "2024-05-02", "2024-05-03"]);
    }

    #[test]
    fn test_identification_record_id() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap();
        let record = IdentificationRecord::new(PlantIdentification::assumed("Ficus"), None, now);
        assert_eq!(record.id, "Ficus_20240501093005");
        assert!(record.timestamp.starts_with("2024-05-01T09:30:05"));
    }

    #[test]
    fn test_newest_for_name() {
        let older = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let newer = Local.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let records = vec![
            IdentificationRecord::new(PlantIdentification::assumed("Ficus"), None, newer),
            IdentificationRecord::new(PlantIdentification::assumed("Ficus"), None, older),
            IdentificationRecord::new(PlantIdentification::assumed("Pothos"), None, newer),
        ];
        let found = newest_for(&records, "Ficus").unwrap();
        assert_eq!(found.id, "Ficus_20240601090000");
        assert!(newest_for(&records, "Cactus").is_none());
    }

    #[test]
    fn test_naive_projection() {
        assert!(naive_projection(&[]).is_empty());
        let projection = naive_projection(&[GrowthRecord::new("2024-05-01", 10.0)]);
        assert_eq!(projection.len(), 7);
        assert_eq!(projection[0].date, "forecast+1d");
        assert_eq!(projection[0].height, 11.0);
        assert_eq!(projection[6].height, 17.0);
    }

    #[test]
    fn test_comparison_comment() {
        assert_eq!(comparison_comment(&[]), "-");
        assert_eq!(comparison_comment(&[GrowthRecord::new("2024-05-01", 10.0)]), "-");
        let history = [
            GrowthRecord::new("2024-05-01", 10.0),
            GrowthRecord::new("2024-05-02", 12.5),
        ];
        assert_eq!(
            comparison_comment(&history),
            "2.5cm increase compared with the previous record"
        );
        let shrinking = [
            GrowthRecord::new("2024-05-01", 10.0),
            GrowthRecord::new("2024-05-02", 9.0),
        ];
        assert_eq!(
            comparison_comment(&shrinking),
            "-1cm decrease compared with the previous record"
        );
    }
}
