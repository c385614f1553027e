//! Remote directory client.
//! One GET per lookup against a `%s` URL template, strict decode first,
//! and a single lenient re-fetch when the payload carries unknown fields.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::record::{decode_lenient, decode_strict, DecodeError, Record};

const PLACEHOLDER: &str = "%s";

/// Validated URL template with exactly one `%s` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: template.to_owned(),
            reason: reason.to_owned(),
        };

        match template.matches(PLACEHOLDER).count() {
            0 => return Err(invalid("missing %s placeholder")),
            1 => {}
            _ => return Err(invalid("more than one %s placeholder")),
        }

        let probe = template.replace(PLACEHOLDER, "id");
        let url = Url::parse(&probe).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        Ok(Self(template.to_owned()))
    }

    /// Substitute `id` verbatim at the placeholder.
    pub fn expand(&self, id: &str) -> String {
        self.0.replacen(PLACEHOLDER, id, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP client bounds for remote lookups.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub connect_timeout: Duration,
    /// Covers sending the request and reading the whole body.
    pub request_timeout: Duration,
    pub use_system_proxy: bool,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            use_system_proxy: true,
        }
    }
}

#[derive(Debug)]
pub enum FetchError {
    /// The HTTP client could not be built.
    Client(reqwest::Error),
    Transport(reqwest::Error),
    Status(u16),
    Decode(DecodeError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Client(e) => write!(f, "http client error: {e}"),
            FetchError::Transport(e) => write!(f, "transport error: {e}"),
            FetchError::Status(code) => write!(f, "remote returned HTTP {code}"),
            FetchError::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Client(e) | FetchError::Transport(e) => Some(e),
            FetchError::Status(_) => None,
            FetchError::Decode(e) => Some(e),
        }
    }
}

impl From<DecodeError> for FetchError {
    fn from(e: DecodeError) -> Self {
        FetchError::Decode(e)
    }
}

/// Shared by every adapter of a directory; cloning reuses the connection pool.
#[derive(Clone)]
pub struct RemoteFetcher {
    http: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(settings: &RemoteSettings) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .pool_idle_timeout(Duration::from_secs(90));
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(FetchError::Client)?;
        Ok(Self { http })
    }

    /// Fetch and decode the record for `id`.
    pub async fn fetch<R: Record>(&self, template: &UrlTemplate, id: &str) -> Result<R, FetchError> {
        let url = template.expand(id);
        debug!(kind = R::KIND, url = %url, "fetching remote record");

        let body = self.get_body(&url).await?;
        match decode_strict::<R>(&body) {
            Ok(record) => Ok(record),
            Err(DecodeError::UnknownField(field)) => {
                warn!(
                    kind = R::KIND,
                    field = %field,
                    "unknown property in remote json, retrying while ignoring unknown properties"
                );
                let body = self.get_body(&url).await?;
                Ok(decode_lenient::<R>(&body)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        Ok(body.to_vec())
    }
}
