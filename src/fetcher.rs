//! Page fetcher: visible text and links of a quiz page.
//!
//! Fetching never fails from the caller's point of view. Network errors,
//! non-2xx statuses and undecodable bodies all yield an empty [`PageContent`]
//! and a warning in the log.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// A hyperlink found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub text: String,
    pub href: String,
}

/// Extracted page text plus its links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub text: String,
    pub links: Vec<PageLink>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PageContent;
}

/// Plain HTTP fetcher with HTML-to-text extraction.
pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; QuizAgent/1.0)")
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn try_fetch(&self, url: &str) -> anyhow::Result<PageContent> {
        let base = Url::parse(url)?;
        let response = self.http.get(base.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error: {}", status);
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));
        let body = response.text().await?;

        if !is_html {
            return Ok(PageContent {
                text: body,
                links: Vec::new(),
            });
        }

        Ok(PageContent {
            text: extract_text_from_html(&body),
            links: extract_links(&body, &base),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> PageContent {
        match self.try_fetch(url).await {
            Ok(page) => {
                tracing::debug!(url, chars = page.text.len(), links = page.links.len(), "Fetched page");
                page
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Scraping error");
                PageContent::default()
            }
        }
    }
}

/// Subtrees that never contribute visible text.
const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Collect `<a href>` targets, resolved against the page URL.
pub fn extract_links(html: &str, base: &Url) -> Vec<PageLink> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&anchors)
        .filter_map(|anchor| {
            let raw = anchor.value().attr("href")?.trim();
            let href = base.join(raw).ok()?;
            Some(PageLink {
                text: normalize_whitespace(&collect_element_text(anchor).join(" ")),
                href: href.to_string(),
            })
        })
        .collect()
}

/// Extract readable text from HTML, skipping scripts and styles.
pub fn extract_text_from_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let parts = collect_element_text(document.root_element());
    normalize_whitespace(&parts.join(" "))
}

fn collect_element_text(element: ElementRef) -> Vec<String> {
    if SKIP_TAGS.contains(&element.value().name()) {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    parts.extend(collect_element_text(child));
                }
            }
            _ => {}
        }
    }
    parts
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
