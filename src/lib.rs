//! # Quiz Agent
//!
//! An LLM tool-dispatch agent that solves web-hosted quiz tasks.
//!
//! This library provides:
//! - An HTTP API that accepts quiz URLs and answers them in the background
//! - A tool-based agent loop that scrapes, downloads and analyses data
//! - A synchronous Q&A endpoint that routes one question to one tool
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a task via the API and queue it
//! 2. Scrape the quiz page and build a prompt with the available tools
//! 3. Call the LLM, execute any tool calls, feed results back
//! 4. Parse the JSON final answer and POST it to the submission target
//!
//! ## Example
//!
//! ```rust,ignore
//! use quiz_agent::{api, AgentConfig};
//!
//! let config = AgentConfig::from_env()?;
//! api::serve_agent(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod llm;
pub mod submit;
pub mod task;
pub mod tools;
pub mod worker;

pub use config::{AgentConfig, QaConfig};
