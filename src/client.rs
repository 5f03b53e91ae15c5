//! Autosend async client implementation.

use crate::{
    ApiError, Context, Error, RateLimitInfo, Result, SendEmailRequest, SendEmailResponse, validate,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Autosend API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.autosend.com/v1";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT_VALUE: &str = concat!("autosend-rs/", env!("CARGO_PKG_VERSION"));
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";
const SEND_EMAIL_PATH: &str = "/mails/send";

/// Async client for the Autosend transactional email API.
///
/// Cheap to clone and safe to share between tasks; all configuration is fixed
/// at construction. Use [`Client::new`] for defaults, [`Client::builder`] or
/// [`Client::with_options`] to override them, or [`Client::with_config`] to
/// start from a [`Config`] struct.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a builder seeded with the default endpoint, timeout and
    /// transport.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Create a client with default settings.
    ///
    /// # Examples
    /// ```no_run
    /// # fn main() -> Result<(), autosend_client::Error> {
    /// let client = autosend_client::Client::new("as_live_key")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_key).build()
    }

    /// Create a client from a [`Config`].
    ///
    /// An empty `base_url`, a zero `timeout` or a missing `http_client` fall
    /// back to the defaults; anything else is used as given. `timeout` only
    /// configures the default transport: a supplied `http_client` keeps its
    /// own timeout.
    pub fn with_config(config: Config) -> Result<Self> {
        let mut builder = ClientBuilder::new(config.api_key);
        if !config.base_url.is_empty() {
            builder = builder.base_url(config.base_url);
        }
        match config.http_client {
            Some(http) => builder = builder.http_client(http),
            None if !config.timeout.is_zero() => builder = builder.timeout(config.timeout),
            None => {}
        }
        builder.build()
    }

    /// Create a client by applying `options` in order to the defaults.
    ///
    /// # Examples
    /// ```no_run
    /// use autosend_client::{Client, with_base_url, with_timeout};
    /// use std::time::Duration;
    ///
    /// # fn main() -> Result<(), autosend_client::Error> {
    /// let client = Client::with_options(
    ///     "as_live_key",
    ///     [
    ///         with_base_url("https://staging.autosend.com/v1"),
    ///         with_timeout(Duration::from_secs(10)),
    ///     ],
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_options<I>(api_key: impl Into<String>, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = ClientOption>,
    {
        options
            .into_iter()
            .fold(ClientBuilder::new(api_key), ClientBuilder::option)
            .build()
    }

    /// The endpoint all requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The timeout applied to each request, or `None` when requests are
    /// only bounded by the transport's own settings and the [`Context`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Send an email.
    ///
    /// The request is validated first; an invalid request returns
    /// [`Error::Validation`] without touching the network.
    ///
    /// # Examples
    /// ```no_run
    /// use autosend_client::{Client, Context, EmailAddress, SendEmailRequest};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), autosend_client::Error> {
    /// let client = Client::new("as_live_key")?;
    /// let request = SendEmailRequest::new(
    ///     EmailAddress::with_name("customer@example.com", "Jane Smith"),
    ///     "hello@mail.example.com",
    /// )
    /// .subject("Welcome!")
    /// .html("<p>Thanks for signing up.</p>");
    ///
    /// let response = client.send_email(&Context::background(), &request).await?;
    /// println!("{}", response.data.email_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_email(
        &self,
        ctx: &Context,
        request: &SendEmailRequest,
    ) -> Result<SendEmailResponse> {
        self.send_email_with_idempotency(ctx, request, "").await
    }

    /// Send an email with an idempotency key.
    ///
    /// Repeating a call with the same key lets the API return the original
    /// result instead of sending a duplicate. An empty key sends no
    /// `Idempotency-Key` header.
    pub async fn send_email_with_idempotency(
        &self,
        ctx: &Context,
        request: &SendEmailRequest,
        idempotency_key: &str,
    ) -> Result<SendEmailResponse> {
        validate(request)?;

        let response = self
            .execute(
                ctx,
                Method::POST,
                SEND_EMAIL_PATH,
                Some(request),
                idempotency_key,
            )
            .await?;

        if response.status() != StatusCode::OK {
            return Err(self.classify(ctx, response).await);
        }

        let body = ctx.run(response.bytes()).await??;
        serde_json::from_slice(&body).map_err(Error::Decode)
    }

    /// Serialize, authenticate and dispatch one request.
    ///
    /// Returns the raw response for any status; only local and transport
    /// failures are errors here.
    #[instrument(skip(self, ctx, body), fields(url = %self.url(path)))]
    async fn execute<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency_key: &str,
    ) -> Result<Response> {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::Encode)?;

        if let Some(reason) = ctx.err() {
            debug!(%reason, "context done before dispatch");
            return Err(reason.into());
        }

        let mut request = self
            .http
            .request(method, self.url(path))
            .headers(self.headers(idempotency_key)?);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        debug!(
            idempotent = !idempotency_key.is_empty(),
            "dispatching request"
        );
        let response = ctx.run(request.send()).await??;
        debug!(status = response.status().as_u16(), "received response");

        Ok(response)
    }

    /// Turn a non-200 response into an [`Error`], consuming the body.
    async fn classify(&self, ctx: &Context, response: Response) -> Error {
        let status = response.status();
        let headers = response.headers().clone();

        let err = match ctx.run(response.bytes()).await {
            Err(reason) => return reason.into(),
            Ok(Ok(body)) => ApiError::from_parts(status, &headers, &body),
            Ok(Err(read_err)) => ApiError::new(
                status,
                format!("failed to read error response: {read_err}"),
                Vec::new(),
                0,
                RateLimitInfo::from_headers(&headers),
            ),
        };

        debug!(
            status = err.status(),
            kind = ?err.kind(),
            "classified API error"
        );
        Error::Api(err)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build headers for API requests.
    fn headers(&self, idempotency_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        if !idempotency_key.is_empty() {
            headers.insert(IDEMPOTENCY_KEY, HeaderValue::from_str(idempotency_key)?);
        }

        Ok(headers)
    }
}

/// Plain configuration for [`Client::with_config`].
///
/// Zero values (`""`, `Duration::ZERO`, `None`) mean "use the default".
#[derive(Clone, Default)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    /// Transport to send requests through. A default `reqwest::Client` is
    /// built when unset.
    pub http_client: Option<reqwest::Client>,
    /// Timeout for the default transport; ignored when `http_client` is set.
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("http_client", &self.http_client.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A configuration step for [`Client::with_options`] or
/// [`ClientBuilder::option`].
pub type ClientOption = Box<dyn FnOnce(&mut ClientBuilder) + Send>;

/// Use a different API endpoint.
pub fn with_base_url(base_url: impl Into<String>) -> ClientOption {
    let base_url = base_url.into();
    Box::new(move |builder| builder.base_url = base_url)
}

/// Send requests through a caller-supplied `reqwest::Client`.
pub fn with_http_client(http: reqwest::Client) -> ClientOption {
    Box::new(move |builder| builder.set_http_client(http))
}

/// Override the per-request timeout. `Duration::ZERO` disables it.
pub fn with_timeout(timeout: Duration) -> ClientOption {
    Box::new(move |builder| builder.set_timeout(timeout))
}

/// Builder for configuring an Autosend client.
///
/// Start with [`Client::builder`] to override defaults.
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("http", &self.http.is_some())
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - [`DEFAULT_BASE_URL`]
    /// - [`DEFAULT_TIMEOUT`]
    /// - a fresh `reqwest::Client` using that timeout
    ///
    /// Timeout and transport interact in call order: [`http_client`](Self::http_client)
    /// drops any timeout set so far in favour of the supplied client's own,
    /// and a later [`timeout`](Self::timeout) is applied on top of it.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            http: None,
        }
    }

    /// Override the API endpoint.
    ///
    /// Useful for testing against a local server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    ///
    /// `Duration::ZERO` means no timeout. Applies to a transport supplied
    /// earlier through [`http_client`](Self::http_client) as well.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.set_timeout(timeout);
        self
    }

    /// Use a caller-supplied `reqwest::Client` for all requests.
    ///
    /// The client's own timeout governs unless [`timeout`](Self::timeout) is
    /// called afterwards.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.set_http_client(http);
        self
    }

    /// Apply a [`ClientOption`].
    pub fn option(mut self, option: ClientOption) -> Self {
        option(&mut self);
        self
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
    }

    fn set_http_client(&mut self, http: reqwest::Client) {
        self.http = Some(http);
        self.timeout = None;
    }

    /// Build the client.
    ///
    /// Fails only if the default transport cannot be created.
    pub fn build(self) -> Result<Client> {
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(Client {
            http,
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
        })
    }
}
