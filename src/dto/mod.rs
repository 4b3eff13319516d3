pub mod assessment_dto;
pub mod ats_dto;
pub mod filter_dto;
pub mod insight_dto;
pub mod workflow_dto;
