use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::errors::{AgentError, AgentResult};

pub const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
pub const SYNTHESIZE_TEMPLATE: &str = include_str!("prompts/synthesize.md");
pub const ANALYSIS_TEMPLATE: &str = include_str!("prompts/analysis.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// Render a template, folding tera's error chain into a single message
pub fn render_prompt<T: Serialize>(template: &str, context_data: &T) -> AgentResult<String> {
    load_prompt(template, context_data).map_err(|e| {
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        AgentError::Template(message)
    })
}
