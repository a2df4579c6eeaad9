use std::time::Duration;

use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::notion_client::NotionClient;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub notion: NotionSettings,
    pub email_client: Option<EmailClientSettings>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct NotionSettings {
    pub base_url: String,
    pub api_version: String,
    pub api_token: Option<SecretString>,
    pub database_id: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_ms: u64,
}

impl NotionSettings {
    /// `None` until both the integration token and the database id are set.
    pub fn client(self) -> Option<NotionClient> {
        let api_token = self.api_token?;
        let database_id = self.database_id?;

        Some(NotionClient::new(
            self.base_url,
            self.api_version,
            api_token,
            database_id,
            Duration::from_millis(self.timeout_ms),
        ))
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub auth_token: SecretString,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_ms: u64,
}

impl EmailClientSettings {
    pub fn client(self) -> EmailClient {
        let sender = self.sender().expect("Invalid sender email address.");
        let timeout = self.timeout();
        EmailClient::new(self.base_url, sender, self.auth_token, timeout)
    }

    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "{other} is not supported environment. Try to use `local` or `production`",
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine current directory");
    let conf_dir = base_path.join("configuration");
    let env: Environment = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENV");

    let settings = config::Config::builder()
        .add_source(
            config::File::with_name(
                conf_dir
                    .join("base")
                    .to_str()
                    .expect("Failed to read base configuration"),
            )
            .required(true),
        )
        .add_source(
            config::File::with_name(
                conf_dir
                    .join(env.as_str())
                    .to_str()
                    .expect("Failed to read environment configuration"),
            )
            .required(true),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .prefix_separator("_"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
