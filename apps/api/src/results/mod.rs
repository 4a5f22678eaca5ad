// Persisted analysis results: save, list by owner, fetch by id.

pub mod handlers;
pub mod store;
