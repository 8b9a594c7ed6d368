use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use super::TextSource;
use crate::core::config::SourceSettings;
use crate::core::errors::RagError;

pub struct WikipediaSource {
    base_url: String,
    client: Client,
}

impl WikipediaSource {
    pub fn new(settings: &SourceSettings) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn article_url(&self, topic: &str) -> String {
        let title = topic.trim().replace(' ', "_");
        format!("{}/{}", self.base_url, urlencoding::encode(&title))
    }
}

#[async_trait]
impl TextSource for WikipediaSource {
    async fn fetch(&self, topic: &str) -> Result<Option<String>, RagError> {
        let url = self.article_url(topic);
        tracing::debug!(%url, "Fetching article");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RagError::ProviderFailure(format!("failed to fetch {}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(topic, "Article not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RagError::ProviderFailure(format!(
                "failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let html = response.text().await.map_err(RagError::provider)?;
        Ok(Some(clean_article_html(&html)))
    }
}

fn paragraph_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("p").expect("paragraph selector"))
}

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d+\]").expect("citation pattern"))
}

fn blank_lines_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("blank line pattern"))
}

/// Paragraph text of an article page: one line per `<p>`, citation markers
/// removed, blank-line runs collapsed, trimmed.
pub fn clean_article_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut corpus = String::new();
    for paragraph in document.select(paragraph_selector()) {
        corpus.extend(paragraph.text());
        corpus.push('\n');
    }

    let corpus = citation_regex().replace_all(&corpus, "");
    let corpus = blank_lines_regex().replace_all(&corpus, "\n\n");
    corpus.trim().to_string()
}
