// Repository trait for identifications and growth logs
use crate::domain::plant::PlantIdentification;
use crate::domain::records::{GrowthRecord, IdentificationRecord};
use async_trait::async_trait;

#[async_trait]
pub trait PlantRepository: Send + Sync {
    /// Store an identification and return its generated id
    async fn save_identification(
        &self,
        identification: &PlantIdentification,
        file_hash: Option<String>,
    ) -> anyhow::Result<String>;

    /// Look up by id when given, otherwise the newest record for the plant name
    async fn load_identification(
        &self,
        data_id: Option<&str>,
        plant_name: Option<&str>,
    ) -> anyhow::Result<Option<IdentificationRecord>>;

    /// Insert a growth record, replacing the height of an existing record
    /// with the same date
    async fn save_growth_record(&self, plant_id: &str, record: GrowthRecord) -> anyhow::Result<()>;

    /// Growth records of a plant sorted by date
    async fn growth_history(&self, plant_id: &str) -> anyhow::Result<Vec<GrowthRecord>>;
}
