//! Prompt templates for the agent.

use crate::fetcher::PageContent;
use crate::tools::ToolRegistry;

/// Build the single task prompt sent at the start of a run.
///
/// Only the gathered page content goes in; caller credentials never do.
pub fn build_task_prompt(page: &PageContent, tools: &ToolRegistry, require_submit_url: bool) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let links = if page.links.is_empty() {
        "(none)".to_string()
    } else {
        page.links
            .iter()
            .map(|l| format!("- {}: {}", l.text, l.href))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let (goal, output_format) = if require_submit_url {
        (
            "Solve the question AND find the submission URL.",
            r#"{"answer": YOUR_ANSWER_HERE, "submit_url": "THE_SUBMISSION_URL_HERE"}"#,
        )
    } else {
        ("Solve the question.", r#"{"answer": YOUR_ANSWER_HERE}"#)
    };

    let find_target = if require_submit_url {
        "\n4. Find the URL mentioned in the text where the answer should be posted (e.g. \"Post your answer to...\"). Never invent one."
    } else {
        ""
    };
    let final_step = if require_submit_url { 5 } else { 4 };

    format!(
        r#"You are an autonomous data analyst.

## Task Description
---
{text}
---

## Available Links
{links}

## Available Tools
{tool_descriptions}

## Your Goal
{goal}

## Steps
1. If there is a file link (CSV, PDF, etc.), use `download_file`.
2. If you have a file, write Python code to analyse it using `run_python_analysis`.
3. IMPORTANT: your Python code must store the final computed value in a variable named `answer`.{find_target}
{final_step}. When you are done, reply with ONLY a valid JSON object strictly in this format:
   {output_format}"#,
        text = page.text,
        links = links,
        tool_descriptions = tool_descriptions,
        goal = goal,
        find_target = find_target,
        final_step = final_step,
        output_format = output_format,
    )
}

/// Follow-up sent when the final reply could not be accepted.
pub fn correction_prompt(problem: &str, require_submit_url: bool) -> String {
    let keys = if require_submit_url {
        r#"{"answer": ..., "submit_url": "..."}"#
    } else {
        r#"{"answer": ...}"#
    };
    format!(
        "Your last reply could not be used: {}. Reply again with ONLY a JSON object of the form {} and nothing else.",
        problem, keys
    )
}
