//! Server configuration.
//!
//! Every option can be given as a flag or an environment variable; flags
//! win over the environment, which wins over the defaults.

use std::fmt;

use clap::Parser;
use flow_core::{ClientCredentials, FlowConfig, JwtConfig, OAuth2Config};

#[derive(Clone, Parser)]
#[command(name = "flow-server")]
#[command(about = "User account service with password and OAuth2 sign-in")]
#[command(version)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 1323)]
    pub port: u16,

    /// Enable debug logging
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Gzip compression level (1-9)
    #[arg(long, env = "GZIP_LEVEL", default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..=9))]
    pub gzip_level: u32,

    /// Allowed CORS origin; repeat for more than one
    #[arg(long = "allow-origin", env = "ALLOW_ORIGINS", value_delimiter = ',')]
    pub allow_origins: Vec<String>,

    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://flow-users.db")]
    pub database_url: String,

    /// Issuer written to and required in bearer tokens
    #[arg(long, env = "JWT_ISSUER", default_value = "flow-users")]
    pub jwt_issuer: String,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET", value_parser = non_blank)]
    pub jwt_secret: String,

    #[arg(long, env = "GITHUB_CLIENT_ID", default_value = "")]
    pub github_client_id: String,

    #[arg(long, env = "GITHUB_CLIENT_SECRET", default_value = "")]
    pub github_client_secret: String,

    #[arg(long, env = "GOOGLE_CLIENT_ID", default_value = "")]
    pub google_client_id: String,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET", default_value = "")]
    pub google_client_secret: String,

    #[arg(long, env = "TWITTER_CLIENT_ID", default_value = "")]
    pub twitter_client_id: String,

    #[arg(long, env = "TWITTER_CLIENT_SECRET", default_value = "")]
    pub twitter_client_secret: String,
}

/// Rejects empty and whitespace-only values.
fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

impl ServerConfig {
    /// Configuration handed to the account core.
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig {
            jwt: JwtConfig {
                issuer: self.jwt_issuer.clone(),
                secret: self.jwt_secret.clone(),
            },
            oauth2: OAuth2Config {
                github: ClientCredentials::new(&self.github_client_id, &self.github_client_secret),
                google: ClientCredentials::new(&self.google_client_id, &self.google_client_secret),
                twitter: ClientCredentials::new(
                    &self.twitter_client_id,
                    &self.twitter_client_secret,
                ),
            },
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("debug", &self.debug)
            .field("gzip_level", &self.gzip_level)
            .field("allow_origins", &self.allow_origins)
            .field("database_url", &self.database_url)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("oauth2", &self.flow_config().oauth2.enabled())
            .finish_non_exhaustive()
    }
}
