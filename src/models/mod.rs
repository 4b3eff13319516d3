pub mod assessment;
pub mod ats;
pub mod event;
pub mod profile;
pub mod response;
