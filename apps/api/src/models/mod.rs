pub mod application;
pub mod job_role;
pub mod resume;
pub mod user;
