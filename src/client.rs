use futures::future::Future;
use futures::Stream;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client as HyperClient, Request};
use hyper_rustls::HttpsConnector;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::timer::{timeout, Timeout};
use tracing::{debug, warn};
use url::{self, Url};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::form::Values;
use crate::null_as_default;

const DNS_WORKER_THREADS: usize = 4;
const TOKEN: &str = "token";
const DEFAULT_API_URL: &str = "https://slack.com/api/";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Future resolving to the result of one API call.
pub type ApiFuture<T> = Box<dyn Future<Item = T, Error = Error> + Send>;

/// Future resolving to the raw body of a successful HTTP exchange.
pub type TransportFuture = ApiFuture<Vec<u8>>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http transport error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("invalid http request: {0}")]
    Http(#[from] hyper::http::Error),
    #[error("unable to decode response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api url must use https")]
    InvalidUrl,
    #[error("unexpected http status {status}")]
    Status { status: u16, body: String },
    #[error("deadline elapsed before the response arrived")]
    Timeout,
    #[error("timer failure: {0}")]
    Timer(tokio::timer::Error),
    #[error("slack api error: {0}")]
    Response(ErrorResponse),
}

impl Error {
    /// Error code reported by the API, if this is an API-level failure.
    pub fn api_error(&self) -> Option<&str> {
        match self {
            Error::Response(response) => Some(response.error.as_str()),
            _ => None,
        }
    }
}

/// Failure reported inside a well-formed response envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ErrorResponse {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub error: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub response_metadata: ResponseMetadata,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.response_metadata.messages.is_empty() {
            f.write_str(&self.error)
        } else {
            write!(
                f,
                "{}: {}",
                self.error,
                self.response_metadata.messages.join(", ")
            )
        }
    }
}

impl std::error::Error for ErrorResponse {}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ResponseMetadata {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub next_cursor: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub messages: Vec<String>,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub warnings: Vec<String>,
}

/// Fields shared by every API response.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SlackResponse {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub ok: bool,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub warning: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub response_metadata: ResponseMetadata,
}

impl SlackResponse {
    /// An envelope only counts as failed when it names an error.
    pub fn err(&self) -> Result<(), Error> {
        if self.ok || self.error.trim().is_empty() {
            return Ok(());
        }

        Err(Error::Response(ErrorResponse {
            error: self.error.clone(),
            response_metadata: self.response_metadata.clone(),
        }))
    }
}

/// Response bodies that embed a `SlackResponse`.
pub(crate) trait Envelope {
    fn envelope(&self) -> &SlackResponse;
}

pub(crate) fn decode_envelope<R>(method: &str, body: &[u8]) -> Result<R, Error>
where
    R: DeserializeOwned + Envelope,
{
    let response: R = serde_json::from_slice(body)?;

    let envelope = response.envelope();
    if !envelope.warning.is_empty() {
        warn!(method = %method, warning = %envelope.warning, "api call returned a warning");
    }
    envelope.err()?;

    Ok(response)
}

/// Per-call options handed through to the transport.
///
/// Cancelling a call is done by dropping its future; the context only
/// carries an optional deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// No deadline.
    pub fn background() -> Self {
        Context::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Context {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Context::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Something able to POST a form to an API method and hand back the body.
pub trait Transport: Send + Sync {
    fn post(&self, ctx: &Context, method: &str, form: &Values) -> TransportFuture;
}

pub struct HyperTransport {
    base_url: Url,
    hyper: HyperClient<HttpsConnector<hyper::client::HttpConnector>, Body>,
}

impl HyperTransport {
    pub fn new(mut base_url: Url) -> Result<Self, Error> {
        if base_url.scheme() != "https" {
            return Err(Error::InvalidUrl);
        }

        // Methods are joined onto the base, which only works below a directory
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let https = HttpsConnector::new(DNS_WORKER_THREADS);
        let hyper: HyperClient<_, Body> = HyperClient::builder().build(https);

        Ok(HyperTransport { base_url, hyper })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HyperTransport({})", self.base_url)
    }
}

impl Transport for HyperTransport {
    fn post(&self, ctx: &Context, method: &str, form: &Values) -> TransportFuture {
        let url = match self.base_url.join(method) {
            Ok(url) => url,
            Err(err) => return Box::new(futures::future::err(Error::from(err))),
        };

        debug!("POST {}", url.as_str());
        let request = Request::post(url.as_str())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Body::from(form.encode()));
        let request = match request {
            Ok(request) => request,
            Err(err) => return Box::new(futures::future::err(Error::from(err))),
        };

        let exchange = self
            .hyper
            .request(request)
            .map_err(Error::from)
            .and_then(|res| {
                let status = res.status();
                res.into_body()
                    .concat2()
                    .map_err(Error::from)
                    .and_then(move |body| {
                        if status.is_success() {
                            Ok(body.to_vec())
                        } else {
                            Err(Error::Status {
                                status: status.as_u16(),
                                body: String::from_utf8_lossy(&body).into_owned(),
                            })
                        }
                    })
            });

        with_deadline(ctx, exchange)
    }
}

fn with_deadline<F>(ctx: &Context, exchange: F) -> TransportFuture
where
    F: Future<Item = Vec<u8>, Error = Error> + Send + 'static,
{
    match ctx.deadline() {
        None => Box::new(exchange),
        Some(deadline) => Box::new(Timeout::new_at(exchange, deadline).map_err(
            |err: timeout::Error<Error>| {
                if err.is_elapsed() {
                    Error::Timeout
                } else if err.is_timer() {
                    err.into_timer().map_or(Error::Timeout, Error::Timer)
                } else {
                    err.into_inner().unwrap_or(Error::Timeout)
                }
            },
        )),
    }
}

#[derive(Clone)]
struct Token(String);

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    token: Token,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SlackClient")
    }
}

impl Client {
    /// Client talking to the public API endpoint.
    pub fn new<S: Into<String>>(token: S) -> Result<Self, Error> {
        let url = Url::parse(DEFAULT_API_URL)?;
        Client::with_base_url(token, url)
    }

    pub fn with_base_url<S: Into<String>>(token: S, url: Url) -> Result<Self, Error> {
        let transport = HyperTransport::new(url)?;
        Ok(Client::with_transport(token, Arc::new(transport)))
    }

    pub fn with_transport<S, T>(token: S, transport: Arc<T>) -> Self
    where
        S: Into<String>,
        T: Transport + 'static,
    {
        Client {
            transport,
            token: Token(token.into()),
        }
    }

    /// Fresh form seeded with the access token.
    pub(crate) fn form(&self) -> Values {
        let mut form = Values::new();
        form.add(TOKEN, self.token.0.as_str());
        form
    }

    pub(crate) fn post_method<R>(&self, ctx: &Context, method: &'static str, form: Values) -> ApiFuture<R>
    where
        R: DeserializeOwned + Envelope + Send + 'static,
    {
        let fields: Vec<&str> = form.keys().filter(|key| *key != TOKEN).collect();
        debug!(method = %method, fields = ?fields, "calling api method");

        Box::new(
            self.transport
                .post(ctx, method, &form)
                .and_then(move |body| decode_envelope::<R>(method, &body)),
        )
    }
}
