pub mod api;
pub mod completion;
pub mod db;
pub mod drafts;
pub mod error;
pub mod generation;
pub mod mcp;
pub mod models;
pub mod outline;
pub mod regenerate;
pub mod sanitize;
pub mod state;
