/// Hosted chat-completion services that speak the OpenAI-compatible protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    DeepSeek,
    OpenAI,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek",
            Provider::OpenAI => "openai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deepseek" => Some(Provider::DeepSeek),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::DeepSeek, Provider::OpenAI]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "DeepSeek",
            Provider::OpenAI => "ChatGPT (OpenAI)",
        }
    }

    /// Base URL the `/chat/completions` path is appended to.
    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek-chat",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }

    /// Environment variable checked before the config file for this provider's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn list_models(&self) -> Vec<String> {
        match self {
            Provider::DeepSeek => vec![
                "deepseek-chat".to_string(),
                "deepseek-reasoner".to_string(),
            ],
            Provider::OpenAI => vec![
                "gpt-4o".to_string(),
                "gpt-4o-mini".to_string(),
                "gpt-4-turbo".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(Provider::from_str("DeepSeek"), Some(Provider::DeepSeek));
        assert_eq!(Provider::from_str(" openai "), Some(Provider::OpenAI));
        assert_eq!(Provider::from_str("ollama"), None);
    }

    #[test]
    fn test_as_str_round_trips() {
        for provider in Provider::all() {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
    }

    #[test]
    fn test_default_model_is_listed() {
        for provider in Provider::all() {
            let default = provider.default_model().to_string();
            assert!(provider.list_models().contains(&default));
        }
    }
}
