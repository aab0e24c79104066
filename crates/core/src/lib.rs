pub mod domain;
pub mod error;
pub mod fpl;
pub mod llm;
pub mod prompt;
pub mod recommender;

pub mod config {
    use crate::error::CaptainError;
    use crate::llm::Provider;

    pub const DEFAULT_FPL_BASE_URL: &str = "https://fantasy.premierleague.com/api";
    pub const DEFAULT_GAMEWEEK_WINDOW: u32 = 3;
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub fpl_base_url: String,
        pub fpl_timeout_secs: Option<u64>,
        pub fpl_user_agent: Option<String>,
        pub llm_provider: Provider,
        pub llm_model: Option<String>,
        pub llm_temperature: Option<f32>,
        pub llm_max_tokens: Option<u32>,
        pub llm_timeout_secs: Option<u64>,
        pub openai_api_key: Option<String>,
        pub openai_base_url: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: Option<String>,
        pub gameweek_window: u32,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                fpl_base_url: DEFAULT_FPL_BASE_URL.to_string(),
                fpl_timeout_secs: None,
                fpl_user_agent: None,
                llm_provider: Provider::OpenAi,
                llm_model: None,
                llm_temperature: Some(DEFAULT_TEMPERATURE),
                llm_max_tokens: None,
                llm_timeout_secs: None,
                openai_api_key: None,
                openai_base_url: None,
                anthropic_api_key: None,
                anthropic_base_url: None,
                gameweek_window: DEFAULT_GAMEWEEK_WINDOW,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> Result<Self, CaptainError> {
            let defaults = Self::default();

            let llm_provider = match env_nonempty("LLM_PROVIDER") {
                Some(s) => s.parse::<Provider>()?,
                None => defaults.llm_provider,
            };

            let llm_temperature =
                env_parsed::<f32>("LLM_TEMPERATURE")?.or(defaults.llm_temperature);
            let gameweek_window =
                env_parsed::<u32>("GAMEWEEK_WINDOW")?.unwrap_or(defaults.gameweek_window);

            Ok(Self {
                fpl_base_url: env_nonempty("FPL_BASE_URL").unwrap_or(defaults.fpl_base_url),
                fpl_timeout_secs: env_parsed("FPL_TIMEOUT_SECS")?,
                fpl_user_agent: env_nonempty("FPL_USER_AGENT"),
                llm_provider,
                llm_model: env_nonempty("LLM_MODEL"),
                llm_temperature,
                llm_max_tokens: env_parsed("LLM_MAX_TOKENS")?,
                llm_timeout_secs: env_parsed("LLM_TIMEOUT_SECS")?,
                openai_api_key: env_nonempty("OPENAI_API_KEY"),
                openai_base_url: env_nonempty("OPENAI_BASE_URL"),
                anthropic_api_key: env_nonempty("ANTHROPIC_API_KEY"),
                anthropic_base_url: env_nonempty("ANTHROPIC_BASE_URL"),
                gameweek_window,
                sentry_dsn: env_nonempty("SENTRY_DSN"),
            })
        }

        pub fn require_openai_api_key(&self) -> Result<&str, CaptainError> {
            self.openai_api_key.as_deref().ok_or_else(|| {
                CaptainError::Configuration(
                    "OpenAI API key not found; set OPENAI_API_KEY or pass it explicitly"
                        .to_string(),
                )
            })
        }

        pub fn require_anthropic_api_key(&self) -> Result<&str, CaptainError> {
            self.anthropic_api_key.as_deref().ok_or_else(|| {
                CaptainError::Configuration(
                    "Anthropic API key not found; set ANTHROPIC_API_KEY or pass it explicitly"
                        .to_string(),
                )
            })
        }

        pub fn require_gameweek_window(&self) -> Result<u32, CaptainError> {
            if self.gameweek_window == 0 {
                return Err(CaptainError::Configuration(
                    "gameweek window must be at least 1".to_string(),
                ));
            }
            Ok(self.gameweek_window)
        }
    }

    fn env_nonempty(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, CaptainError> {
        env_nonempty(key)
            .map(|raw| parse_value(key, &raw))
            .transpose()
    }

    fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CaptainError> {
        raw.parse::<T>().map_err(|_| {
            CaptainError::Configuration(format!("{key} has an invalid value: {raw:?}"))
        })
    }

}
