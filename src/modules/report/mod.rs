pub mod crud;
pub mod pipeline;
pub mod schema;
