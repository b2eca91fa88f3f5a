use std::str::FromStr;
use std::time;

use envconfig::Envconfig;
use sqlx::postgres::PgConnectOptions;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "USER_ID", default = "your-uuid")]
    pub user_id: String,

    #[envconfig(from = "EVENT_NAME", default = "GPT Response")]
    pub event_name: String,

    #[envconfig(nested = true)]
    pub openai: OpenAiConfig,

    #[envconfig(nested = true)]
    pub database: DatabaseConfig,
}

#[derive(Envconfig, Clone)]
pub struct OpenAiConfig {
    #[envconfig(
        from = "OPENAI_API_URL",
        default = "https://api.openai.com/v1/chat/completions"
    )]
    pub api_url: NonEmptyString,

    #[envconfig(from = "OPENAI_API_KEY")]
    pub api_key: NonEmptyString,

    #[envconfig(from = "OPENAI_MODEL", default = "gpt-4")]
    pub model: NonEmptyString,

    #[envconfig(from = "OPENAI_PROMPT_ROLE", default = "system")]
    pub prompt_role: NonEmptyString,

    #[envconfig(from = "OPENAI_PROMPT", default = "Your prompt here")]
    pub prompt: NonEmptyString,

    /// Unset leaves the HTTP client without a timeout.
    #[envconfig(from = "REQUEST_TIMEOUT_MS")]
    pub request_timeout: Option<EnvMsDuration>,
}

#[derive(Envconfig, Clone)]
pub struct DatabaseConfig {
    #[envconfig(from = "DB_HOST", default = "db")]
    pub host: String,

    #[envconfig(from = "DB_PORT")]
    pub port: u16,

    #[envconfig(from = "DB_USER")]
    pub user: String,

    #[envconfig(from = "DB_PASSWORD")]
    pub password: String,

    #[envconfig(from = "DB_DATABASE")]
    pub database: String,
}

impl DatabaseConfig {
    /// Build options for a single PostgreSQL connection.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StringIsEmptyError;

impl FromStr for NonEmptyString {
    type Err = StringIsEmptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(StringIsEmptyError)
        } else {
            Ok(NonEmptyString(s.to_owned()))
        }
    }
}
