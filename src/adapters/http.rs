use crate::domain::ports::PageFetcher;
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::sync::OnceLock;

const FETCH_USER_AGENT: &str = concat!("coldmail/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let fetch_error = |reason: String| OutreachError::PageFetchError {
            url: url.to_string(),
            reason,
        };

        tracing::debug!("Fetching page: {}", url);
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, FETCH_USER_AGENT)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        tracing::debug!("Page response status: {}", status);
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let looks_like_html =
            content_type.contains("html") || body.trim_start().starts_with('<');
        let text = if looks_like_html {
            html_to_text(&body)
        } else {
            collapse_whitespace(&body)
        };

        if text.is_empty() {
            return Err(fetch_error("page has no readable content".to_string()));
        }
        Ok(text)
    }
}

struct HtmlPatterns {
    hidden: Regex,
    comments: Regex,
    breaks: Regex,
    tags: Regex,
    entity: Regex,
}

fn patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HtmlPatterns {
        hidden: Regex::new(
            r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<template\b.*?</template\s*>",
        )
        .expect("hidden element pattern"),
        comments: Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"),
        breaks: Regex::new(
            r"(?i)<\s*(br|/p|/div|/li|/h[1-6]|/tr|/section|/article|/header|/footer|/ul|/ol|/title)\b[^>]*>",
        )
        .expect("block break pattern"),
        tags: Regex::new(r"(?s)<[^>]*>").expect("tag pattern"),
        entity: Regex::new(r"(?i)&(#x[0-9a-f]+|#\d+|[a-z]+);").expect("entity pattern"),
    })
}

/// 將 HTML 轉為純文字：移除 script/style、標籤換成空白、解碼常見實體
pub fn html_to_text(html: &str) -> String {
    let p = patterns();

    let text = p.hidden.replace_all(html, " ");
    let text = p.comments.replace_all(&text, " ");
    let text = p.breaks.replace_all(&text, "\n");
    let text = p.tags.replace_all(&text, " ");
    let text = decode_entities(&text);

    collapse_whitespace(&text)
}

/// 單次掃描解碼：解碼後的文字不會再被當成實體
fn decode_entities(text: &str) -> String {
    patterns()
        .entity
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(decimal) = body.strip_prefix('#') {
                decimal.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    match name.to_ascii_lowercase().as_str() {
        "nbsp" => Some(' '),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
