pub mod artifacts;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod util;
