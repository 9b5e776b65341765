//! Identity providers and their OAuth client configuration.
//!
//! The registry is built once at startup and handed to the router; nothing is
//! registered globally.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use url::Url;

use super::AuthError;

const GOOGLE_AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

const GITHUB_AUTHORIZATION_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

const SALESFORCE_AUTHORIZATION_URL: &str = "https://login.salesforce.com/services/oauth2/authorize";
const SALESFORCE_TOKEN_URL: &str = "https://login.salesforce.com/services/oauth2/token";

/// Source of a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Local,
    Google,
    Github,
    Salesforce,
}

impl Provider {
    /// Providers that sign in through an OAuth redirect.
    pub const OAUTH: [Provider; 3] = [Provider::Google, Provider::Github, Provider::Salesforce];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Google => "google",
            Provider::Github => "github",
            Provider::Salesforce => "salesforce",
        }
    }

    /// Prefix of the environment variables holding this provider's settings.
    fn env_prefix(self) -> &'static str {
        match self {
            Provider::Local => "LOCAL",
            Provider::Google => "GOOGLE",
            Provider::Github => "GITHUB",
            Provider::Salesforce => "SALESFORCE",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Provider::Local),
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            "salesforce" | "forcedotcom" => Ok(Provider::Salesforce),
            other => Err(AuthError::Config(format!("unknown provider '{other}'"))),
        }
    }
}

/// OAuth client settings for one provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: Url,
    pub authorization_url: Url,
    pub token_url: Url,
    pub scopes: Vec<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("callback_url", &self.callback_url.as_str())
            .field("authorization_url", &self.authorization_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl ProviderConfig {
    /// Config with the provider's well-known endpoints and default scopes.
    pub fn with_defaults(
        provider: Provider,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: &str,
    ) -> Result<Self, AuthError> {
        let (authorization_url, token_url, scopes): (&str, &str, &[&str]) = match provider {
            Provider::Google => (GOOGLE_AUTHORIZATION_URL, GOOGLE_TOKEN_URL, &GOOGLE_SCOPES),
            Provider::Github => (GITHUB_AUTHORIZATION_URL, GITHUB_TOKEN_URL, &[]),
            Provider::Salesforce => (SALESFORCE_AUTHORIZATION_URL, SALESFORCE_TOKEN_URL, &[]),
            Provider::Local => {
                return Err(AuthError::Config(
                    "local sign-in has no OAuth configuration".into(),
                ));
            }
        };
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: parse_url("callback", callback_url)?,
            authorization_url: parse_url("authorization", authorization_url)?,
            token_url: parse_url("token", token_url)?,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// URL of the provider's consent page for the authorization-code flow.
    pub fn authorization_url(&self) -> Url {
        let mut url = self.authorization_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", self.callback_url.as_str());
            if !self.scopes.is_empty() {
                query.append_pair("scope", &self.scopes.join(" "));
            }
        }
        url
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url, AuthError> {
    Url::parse(raw).map_err(|e| AuthError::Config(format!("invalid {what} URL '{raw}': {e}")))
}

/// Provider name → configuration, passed explicitly into the router.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an OAuth provider.
    pub fn register(&mut self, provider: Provider, config: ProviderConfig) -> &mut Self {
        self.providers.insert(provider, config);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&ProviderConfig> {
        self.providers.get(&provider)
    }

    /// Registered OAuth providers in a stable order.
    pub fn providers(&self) -> Vec<Provider> {
        Provider::OAUTH
            .into_iter()
            .filter(|p| self.providers.contains_key(p))
            .collect()
    }

    /// Build the registry from process environment variables.
    ///
    /// | Variable                        | Meaning                          |
    /// |---------------------------------|----------------------------------|
    /// | `<P>_CLIENT_ID`                 | OAuth client id                  |
    /// | `<P>_CLIENT_SECRET`             | OAuth client secret              |
    /// | `<P>_CALLBACK_URL`              | Redirect URI registered upstream |
    /// | `<P>_AUTHORIZATION_URL`         | Optional endpoint override       |
    /// | `<P>_TOKEN_URL`                 | Optional endpoint override       |
    /// | `<P>_SCOPES`                    | Optional space-separated scopes  |
    ///
    /// `<P>` is `GOOGLE`, `GITHUB` or `SALESFORCE`.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Same as [`ProviderRegistry::from_env`] over an arbitrary lookup.
    ///
    /// A provider is registered only when its id, secret and callback URL are
    /// all present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = Self::new();
        for provider in Provider::OAUTH {
            let prefix = provider.env_prefix();
            let var = |name: &str| lookup(&format!("{prefix}_{name}"));

            let (Some(client_id), Some(client_secret), Some(callback_url)) =
                (var("CLIENT_ID"), var("CLIENT_SECRET"), var("CALLBACK_URL"))
            else {
                continue;
            };

            let mut config =
                ProviderConfig::with_defaults(provider, client_id, client_secret, &callback_url)?;
            if let Some(url) = var("AUTHORIZATION_URL") {
                config.authorization_url = parse_url("authorization", &url)?;
            }
            if let Some(url) = var("TOKEN_URL") {
                config.token_url = parse_url("token", &url)?;
            }
            if let Some(scopes) = var("SCOPES") {
                config.scopes = scopes.split_whitespace().map(str::to_string).collect();
            }
            registry.register(provider, config);
        }
        Ok(registry)
    }
}
