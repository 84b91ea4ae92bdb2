pub mod articles;
pub mod briefs;
pub mod chat;
pub mod countries;
pub mod ingestion;
pub mod sources;
pub mod stats;
