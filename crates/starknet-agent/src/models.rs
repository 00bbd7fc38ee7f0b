//! These models represent the objects passed around by the agent
//!
//! There are two families of data we deal with:
//! - conversation messages, sent from the agent to whichever LLM provider is configured
//! - StarkScan entities, fetched by the tools and embedded into prompts and memory
//!
//! Provider wire formats are never stored; each provider converts to and from
//! these structs at its own boundary.
pub mod message;
pub mod starknet;
