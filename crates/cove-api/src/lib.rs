pub mod aggregate;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod reactions;
pub mod state;
pub mod store;
