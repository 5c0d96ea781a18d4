//! Scratch-directory tools: download a file, list what has been downloaded.

use std::path::Path;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::ToolContext;
use crate::error::ToolError;

const DOWNLOAD: &str = "download_file";
const LIST: &str = "list_files";

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadFileArgs {
    pub url: String,
}

/// Fetch `args.url` into the scratch directory under a collision-resistant name.
pub async fn download_file(ctx: &ToolContext, args: &DownloadFileArgs) -> Result<String, ToolError> {
    let url = Url::parse(args.url.trim())
        .map_err(|e| ToolError::argument(DOWNLOAD, format!("invalid url '{}': {}", args.url, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ToolError::argument(
            DOWNLOAD,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    let response = ctx
        .http
        .get(url.clone())
        .timeout(ctx.config.timeout)
        .send()
        .await
        .map_err(|e| ToolError::execution(DOWNLOAD, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::execution(DOWNLOAD, anyhow!("HTTP error: {}", status)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ToolError::execution(DOWNLOAD, e))?;

    let dir = &ctx.config.scratch_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))
        .map_err(|e| ToolError::execution(DOWNLOAD, e))?;

    let path = dir.join(unique_file_name(&name_from_url(&url)));
    tokio::fs::write(&path, &body)
        .await
        .with_context(|| format!("writing {}", path.display()))
        .map_err(|e| ToolError::execution(DOWNLOAD, e))?;

    tracing::info!(url = %url, path = %path.display(), bytes = body.len(), "Downloaded file");
    Ok(format!("File downloaded to: {}", path.display()))
}

/// JSON array of the file names currently in `dir`, sorted.
pub async fn list_files(dir: &Path) -> Result<String, ToolError> {
    let mut names = Vec::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok("[]".to_string()),
        Err(e) => return Err(ToolError::execution(LIST, e)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ToolError::execution(LIST, e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    serde_json::to_string(&names).map_err(|e| ToolError::execution(LIST, e))
}

fn name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| {
            urlencoding::decode(s)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .unwrap_or_default()
}

/// Sanitise `original` and add a random suffix before its extension.
///
/// Names without an extension fall back to `data.csv`.
pub fn unique_file_name(original: &str) -> String {
    let cleaned: String = original
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => ("data", "csv"),
    };

    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}.{}", stem, &suffix[..8], ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn unique_names_keep_extension_and_differ() {
        let a = unique_file_name("sales.csv");
        let b = unique_file_name("sales.csv");
        assert!(a.starts_with("sales_") && a.ends_with(".csv"), "{a}");
        assert_ne!(a, b);
    }

    #[test]
    fn unique_names_fall_back_without_extension() {
        let name = unique_file_name("download");
        assert!(name.starts_with("data_") && name.ends_with(".csv"), "{name}");
    }

    #[test]
    fn unique_names_strip_path_tricks() {
        let name = unique_file_name("../../etc/passwd.txt");
        assert!(!name.contains('/'));
        assert!(!name.starts_with('.'));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn name_from_url_uses_last_segment() {
        let url = Url::parse("https://example.com/files/report%20q1.pdf?x=1").unwrap();
        assert_eq!(name_from_url(&url), "report q1.pdf");
        let root = Url::parse("https://example.com/").unwrap();
        assert_eq!(name_from_url(&root), "");
    }

    #[tokio::test]
    async fn downloads_into_scratch_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/numbers.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(ToolConfig::new(dir.path().join("downloads")));
        let result = download_file(
            &ctx,
            &DownloadFileArgs {
                url: format!("{}/data/numbers.csv", server.uri()),
            },
        )
        .await
        .expect("download");

        let saved = result.strip_prefix("File downloaded to: ").expect("prefix");
        assert!(saved.contains("numbers_"));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "a,b\n1,2\n");

        let listing: Vec<String> =
            serde_json::from_str(&list_files(&ctx.config.scratch_dir).await.unwrap()).unwrap();
        assert_eq!(listing.len(), 1);
    }

    #[tokio::test]
    async fn http_errors_are_execution_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(ToolConfig::new(dir.path().to_path_buf()));
        let err = download_file(
            &ctx,
            &DownloadFileArgs {
                url: format!("{}/missing.csv", server.uri()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(ToolConfig::new(dir.path().to_path_buf()));
        let err = download_file(
            &ctx,
            &DownloadFileArgs {
                url: "file:///etc/passwd".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Argument { .. }));
    }

    #[tokio::test]
    async fn listing_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(list_files(&dir.path().join("nope")).await.unwrap(), "[]");
    }
}
