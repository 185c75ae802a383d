use std::fmt;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::HarvestError;

/// Response body as a lazily read stream of byte chunks.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub redirect_limit: usize,
    /// `None` waits forever, like a plain socket connect.
    pub connect_timeout: Option<Duration>,
    /// Maximum idle time between reads. `None` never gives up on a slow peer.
    pub read_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            redirect_limit: 10,
            connect_timeout: None,
            read_timeout: None,
            user_agent: concat!("mbox-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Optional HTTP basic credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Raw listing page as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// GET the whole body of a (small) page.
    async fn fetch_page(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<FetchedPage, HarvestError>;

    /// GET a resource and hand back its body without buffering it.
    async fn open_stream(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<ByteStream, HarvestError>;

    /// HEAD a resource and read its `Content-Length`; absent or garbled means 0.
    async fn probe_size(&self, url: &str, credentials: &Credentials) -> Result<u64, HarvestError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, HarvestError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }

    /// Issues `method` against `url`, following up to `redirect_limit`
    /// redirects, and accepts only a final `200`.
    ///
    /// Every hop is rebuilt from the original request, so the basic-auth
    /// header reaches redirect targets on other hosts too.
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        credentials: &Credentials,
    ) -> Result<reqwest::Response, HarvestError> {
        let mut current = Url::parse(url).map_err(|err| HarvestError::invalid_url(url, err))?;
        let mut hops = 0usize;

        loop {
            let response = self.send_once(method.clone(), &current, credentials).await?;
            let status = response.status();
            if status.is_redirection() {
                if let Some(next) = redirect_target(&current, &response)? {
                    hops += 1;
                    if hops > self.settings.redirect_limit {
                        engine_warn!("Redirect limit {} exceeded for {}", self.settings.redirect_limit, url);
                        return Err(HarvestError::TooManyRedirects {
                            url: url.to_string(),
                            limit: self.settings.redirect_limit,
                        });
                    }
                    engine_debug!("Redirect {} ({}): {} -> {}", hops, status, current, next);
                    current = next;
                    continue;
                }
            }
            return validate_status(response);
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        credentials: &Credentials,
    ) -> Result<reqwest::Response, HarvestError> {
        engine_info!("{} {}", method, url);
        let mut request = self.client.request(method, url.clone());
        if let Some(username) = credentials.username.as_deref() {
            engine_debug!("Applying basic auth for user {}", username);
            request = request.basic_auth(username, credentials.password.as_deref());
        }
        request
            .send()
            .await
            .map_err(|err| map_reqwest_error(url.as_str(), err))
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<FetchedPage, HarvestError> {
        let response = self.fetch(Method::GET, url, credentials).await?;
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| map_reqwest_error(&final_url, err))?;
        engine_info!("Read {} bytes from {}", bytes.len(), final_url);

        Ok(FetchedPage {
            final_url,
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    async fn open_stream(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<ByteStream, HarvestError> {
        let response = self.fetch(Method::GET, url, credentials).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));
        Ok(stream.boxed())
    }

    async fn probe_size(&self, url: &str, credentials: &Credentials) -> Result<u64, HarvestError> {
        let response = self.fetch(Method::HEAD, url, credentials).await?;
        // reqwest reports a zero body length for HEAD, so read the header itself.
        let size = parse_content_length(response.headers().get(CONTENT_LENGTH));
        engine_debug!("Content-Length of {} is {}", url, size);
        Ok(size)
    }
}

fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, HarvestError> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(settings.user_agent.clone());
    if let Some(timeout) = settings.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = settings.read_timeout {
        builder = builder.read_timeout(timeout);
    }
    builder.build().map_err(|err| HarvestError::Transport {
        url: String::new(),
        message: err.to_string(),
    })
}

fn redirect_target(current: &Url, response: &reqwest::Response) -> Result<Option<Url>, HarvestError> {
    let Some(location) = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };
    current
        .join(location)
        .map(Some)
        .map_err(|err| HarvestError::invalid_url(location, err))
}

fn validate_status(response: reqwest::Response) -> Result<reqwest::Response, HarvestError> {
    let status = response.status();
    let url = response.url().to_string();
    if status == StatusCode::UNAUTHORIZED {
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();
        engine_warn!("401 from {} with challenge {:?}", url, challenge);
        return Err(HarvestError::AuthChallenge { url, challenge });
    }
    if status != StatusCode::OK {
        engine_warn!("Unexpected status {} from {}", status, url);
        return Err(HarvestError::UnexpectedStatus {
            status: status.as_u16(),
            url,
        });
    }
    Ok(response)
}

fn parse_content_length(value: Option<&reqwest::header::HeaderValue>) -> u64 {
    value
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> HarvestError {
    if err.is_timeout() {
        return HarvestError::Timeout {
            url: url.to_string(),
        };
    }
    HarvestError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
