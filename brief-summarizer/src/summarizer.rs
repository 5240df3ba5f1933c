//! Chat-completion summarizer for the digest's news sections
//!
//! Only deduplicated headline text ever reaches the model; structured data
//! (indicators, liquidations, newsletters) is assembled downstream and never
//! included in a prompt.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use tracing::instrument;

use brief_core::{BriefError, BriefResult};

/// Groq's OpenAI-compatible endpoint
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default model
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Which digest section is being summarized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    /// Geopolitics and conflicts
    Geo,
    /// Markets and macro
    Market,
    /// AI and tech
    Tech,
    /// All three sections in one structured pass
    Full,
}

impl SummaryMode {
    /// Response budget per mode
    fn max_tokens(&self) -> u32 {
        match self {
            SummaryMode::Full => 2000,
            _ => 1000,
        }
    }

    /// Input budget per mode; the full brief carries three sections
    pub fn input_cap(&self) -> usize {
        match self {
            SummaryMode::Full => 9000,
            _ => 6000,
        }
    }

    fn prompt(&self, raw: &str) -> String {
        let raw: String = raw.chars().take(self.input_cap()).collect();
        match self {
            SummaryMode::Geo => format!(
                "You are an intelligence analyst. Summarize the following geopolitical and conflict \
                 news headlines into concise, sharp bullets.\n\n\
                 Rules:\n\
                 - One distinct topic per bullet\n\
                 - 1-2 sentences max per bullet\n\
                 - Format links as [link](url) -- never show raw URLs\n\
                 - No market data, no tech news, no newsletter content\n\
                 - Group by region where possible (Europe, Middle East, Asia, Americas)\n\n\
                 Raw headlines:\n{raw}"
            ),
            SummaryMode::Market => format!(
                "You are a macro analyst. Summarize the following market and macro news headlines \
                 into concise bullets.\n\n\
                 Rules:\n\
                 - One distinct topic per bullet\n\
                 - 1-2 sentences max per bullet\n\
                 - Format links as [link](url) -- never show raw URLs\n\
                 - Focus strictly on: rates, central banks, equities, crypto, commodities, economic data\n\
                 - No geopolitics unless directly market-moving, no tech product news, no newsletter content\n\n\
                 Raw headlines:\n{raw}"
            ),
            SummaryMode::Tech => format!(
                "You are an AI and tech analyst. Summarize the following AI and tech news headlines \
                 into concise bullets.\n\n\
                 Rules:\n\
                 - One distinct topic per bullet\n\
                 - 1-2 sentences max per bullet\n\
                 - Format links as [link](url) -- never show raw URLs\n\
                 - Focus strictly on: AI models, research, startups, big tech, developer tools, crypto tech\n\
                 - PRIORITY: Any article from a16zcrypto.com must be included -- it is a high-signal source\n\
                 - No market data, no geopolitics, no newsletter content\n\n\
                 Raw headlines:\n{raw}"
            ),
            SummaryMode::Full => format!(
                "You are a sharp intelligence and market analyst. Summarize the headlines below \
                 into three clearly separated sections.\n\n\
                 Rules:\n\
                 - Only use the RSS headlines provided -- do NOT reference newsletter content\n\
                 - One distinct topic per bullet, 1-2 sentences max\n\
                 - Format ALL links as [link](url) -- never show raw URLs in your output\n\
                 - Strictly separate the three sections -- do not mix topics across them\n\
                 - Group geopolitics by region where possible (Europe, Middle East, Asia, Americas)\n\
                 - Do NOT add sections for newsletters, indicators, commodities, liquidations, or sentiment\n\n\
                 Output EXACTLY this structure and nothing else:\n\n\
                 Geopolitics & Conflicts\n\
                 - bullet [link](url)\n\n\
                 Markets & Macro\n\
                 - bullet [link](url)\n\n\
                 AI & Tech\n\
                 - bullet [link](url)\n\n\
                 Raw headlines:\n{raw}"
            ),
        }
    }
}

/// Groq-backed headline summarizer
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl Summarizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(GROQ_API_BASE)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// One summarization call; retries live in the caller's pipeline
    #[instrument(skip(self, raw), fields(mode = ?mode))]
    pub async fn summarize(&self, raw: &str, mode: SummaryMode) -> BriefResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(mode.prompt(raw))
                .build()
                .map_err(|e| BriefError::internal(e.to_string()))?
                .into()])
            .temperature(0.3)
            .max_tokens(mode.max_tokens())
            .build()
            .map_err(|e| BriefError::internal(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BriefError::api(format!("Groq API error: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| BriefError::parse("Empty completion response"))?;

        Ok(content.trim().to_string())
    }
}

/// Fallback when the model is unavailable: the headlines themselves, capped
pub fn verbatim_fallback(raw: &str) -> String {
    raw.chars().take(3500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_carry_their_section_rules() {
        let geo = SummaryMode::Geo.prompt("headline");
        assert!(geo.contains("intelligence analyst"));
        assert!(geo.contains("headline"));

        let full = SummaryMode::Full.prompt("headline");
        assert!(full.contains("Geopolitics & Conflicts"));
        assert!(full.contains("AI & Tech"));
    }

    #[test]
    fn input_is_capped_per_mode() {
        let long = "y".repeat(20_000);
        assert!(SummaryMode::Geo.prompt(&long).len() < 7_000);
        assert!(SummaryMode::Full.prompt(&long).len() < 10_500);
    }

    #[test]
    fn token_budgets() {
        assert_eq!(SummaryMode::Geo.max_tokens(), 1000);
        assert_eq!(SummaryMode::Full.max_tokens(), 2000);
    }

    #[test]
    fn fallback_is_truncated_verbatim() {
        let raw = "z".repeat(5_000);
        let fb = verbatim_fallback(&raw);
        assert_eq!(fb.len(), 3_500);
        assert!(raw.starts_with(&fb));
    }
}
