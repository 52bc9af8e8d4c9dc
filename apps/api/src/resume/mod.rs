// Resume API: upload and parse, scratch drafts, section edits with version history,
// the section assistant, and job description intake.

pub mod handlers;
pub mod sections;
pub mod versioning;
