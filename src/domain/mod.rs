// Domain layer - Plant growth, diagnosis and record models
pub mod diagnosis;
pub mod error;
pub mod growth;
pub mod narrative;
pub mod plant;
pub mod records;
