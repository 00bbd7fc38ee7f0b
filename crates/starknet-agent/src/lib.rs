pub mod agent;
pub mod errors;
pub mod memory;
pub mod models;
pub mod plan;
pub mod prompt_template;
pub mod providers;
pub mod starkscan;
pub mod tool;
pub mod tools;

pub use agent::{Agent, AgentConfig};
pub use errors::{AgentError, AgentResult};
