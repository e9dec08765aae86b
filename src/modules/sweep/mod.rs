pub mod schema;
pub mod sweeper;

pub use sweeper::{find_referencing_documents, identify_unavailable, ConsistencySweeper};
