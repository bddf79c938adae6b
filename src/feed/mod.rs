//! Downloading and parsing of the daily rate lists.

pub mod cnb;
pub mod csob;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;

use crate::error::{CurrencyError, Result};

pub use cnb::{CnbFeed, DailyList, RateRow};
pub use csob::{BuySell, CsobFeed, RateList};

/// Source of raw feed documents.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn get_text(&self, url: &str, user_agent: Option<&str>) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn get_text(&self, url: &str, user_agent: Option<&str>) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(agent) = user_agent {
            request = request.header(USER_AGENT, agent);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| CurrencyError::FeedUnavailable(format!("{}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(CurrencyError::FeedUnavailable(format!(
                "Can't download {}: {}",
                url,
                resp.status()
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| CurrencyError::FeedUnavailable(format!("{}: {}", url, e)))?;
        if text.trim().is_empty() {
            return Err(CurrencyError::FeedUnavailable(format!("{}: empty response", url)));
        }

        Ok(text)
    }
}

/// Feeds write decimals with a comma.
pub fn normalize_decimal_string(s: &str) -> String {
    s.trim().replace(',', ".")
}

/// Unifies line endings, drops control characters and trailing whitespace,
/// and strips blank lines around the document.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = unified
        .split('\n')
        .map(|line| {
            line.chars()
                .filter(|c| *c == '\t' || !c.is_control())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);

    lines[start..end].join("\n")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_line_endings_and_padding() {
        let text = "\r\n\r\n17.10.2025 #201  \r\nAustralie|dolar|1|AUD|13,567\t\r\n\r\n";
        assert_eq!(
            normalize_text(text),
            "17.10.2025 #201\nAustralie|dolar|1|AUD|13,567"
        );
    }

    #[test]
    fn keeps_inner_blank_lines() {
        assert_eq!(normalize_text("a\n\nb\n"), "a\n\nb");
    }

    #[test]
    fn drops_control_characters() {
        assert_eq!(normalize_text("EMU\u{0}|euro"), "EMU|euro");
    }

    #[test]
    fn blank_document_normalizes_to_empty() {
        assert_eq!(normalize_text(" \r\n \n"), "");
    }

    #[test]
    fn comma_decimals_become_dots() {
        assert_eq!(normalize_decimal_string(" 24,335 "), "24.335");
    }
}
