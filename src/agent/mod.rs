//! Agent module - the core tool-dispatch logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Gather context (scrape the page, or take the question as-is)
//! 2. Call the LLM with the available tools
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM produces a JSON final answer or the budget runs out
//!
//! The Q&A endpoint uses [`QuestionAnswerer`], a single request with at most
//! one tool call.

mod agent_loop;
mod answer;
mod prompt;
mod single_shot;

pub use agent_loop::{Agent, AgentLimits, AgentOutcome};
pub use answer::FinalAnswer;
pub use single_shot::QuestionAnswerer;
