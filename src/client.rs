use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use url::Url;

use crate::backend::{ChatBackend, EventStream};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatRequest, IntroResponse, JournalEntriesCount, Universe, UsageSnapshot};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const BASE_URL_ENV: &str = "COACH_CHAT_BASE_URL";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the coaching dashboard API.
#[derive(Debug, Clone)]
pub struct CoachClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl CoachClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the
    /// COACH_CHAT_BASE_URL environment variable; it defaults to
    /// `http://localhost:8000/`.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds connection setup and the auxiliary GETs.  Chat streams
    /// are not cut off by it once the response has started.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Create and return default headers for API requests.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(e.to_string(), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let path = response.url().path().to_string();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };
        let message = error_message(&error_body);

        match status_code {
            400 | 422 => Error::bad_request(message),
            404 => Error::not_found(message, Some(path)),
            408 => Error::timeout(message, None),
            429 => Error::rate_limit(message, retry_after),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(message, retry_after),
            _ => Error::api(status_code, message),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.map_send_error(e)
        })?;
        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self
            .client
            .get(url)
            .headers(Self::default_headers())
            .timeout(self.timeout);
        let response = self.execute(request).await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    /// Fetch the message quota for the current period.
    pub async fn usage(&self) -> Result<UsageSnapshot> {
        self.get_json("api/chat/usage").await
    }

    /// Fetch the greeting for a universe.
    pub async fn intro(&self, universe: Universe) -> Result<String> {
        let response: IntroResponse = self.get_json(&format!("api/chat/intro/{universe}")).await?;
        Ok(response.intro)
    }

    /// Fetch how many journal entries were written in the last week.
    pub async fn journal_entries_count(&self) -> Result<u32> {
        let response: JournalEntriesCount = self.get_json("api/journal-entries-count").await?;
        Ok(response.count_last_week)
    }

    /// Send a chat message and get the reply as a stream of events.
    ///
    /// A single attempt is made.  Malformed event records are skipped by the
    /// decoder; a transport failure mid-reply is yielded as an error item.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream> {
        let url = self.endpoint("api/chat")?;

        let mut headers = Self::default_headers();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let request = self.client.post(url).headers(headers).json(request);
        let response = self.execute(request).await?;

        Ok(Box::pin(process_sse(response.bytes_stream())))
    }
}

#[async_trait::async_trait]
impl ChatBackend for CoachClient {
    async fn fetch_usage(&self) -> Result<UsageSnapshot> {
        self.usage().await
    }

    async fn fetch_intro(&self, universe: Universe) -> Result<String> {
        self.intro(universe).await
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<EventStream> {
        self.stream_chat(&request).await
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut base_url = base_url.trim().to_string();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    Ok(Url::parse(&base_url)?)
}

/// Pull a readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"error": "..."}`, `{"message": "..."}`
/// and `{"error": {"message": "..."}}`; anything else is returned verbatim.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let candidates = [
        value.get("detail"),
        value.get("error").and_then(|e| e.get("message")),
        value.get("error"),
        value.get("message"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = CoachClient::new(Some("http://coach.example.com".to_string())).unwrap();
        assert_eq!(client.base_url().as_str(), "http://coach.example.com/");
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = CoachClient::with_options(
            Some("https://coach.example.com/v2/".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("api/chat/usage").unwrap().as_str(),
            "https://coach.example.com/v2/api/chat/usage"
        );
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_base_url() {
        let err = CoachClient::new(Some("not a url".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn intro_endpoint_uses_wire_name() {
        let client = CoachClient::new(Some("http://localhost:8000".to_string())).unwrap();
        let url = client
            .endpoint(&format!("api/chat/intro/{}", Universe::TodaysWorkout))
            .unwrap();
        assert_eq!(url.path(), "/api/chat/intro/todays_workout");
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(error_message(r#"{"detail": "quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_message(r#"{"error": {"message": "bad"}}"#), "bad");
        assert_eq!(error_message(r#"{"error": "nope"}"#), "nope");
        assert_eq!(error_message("plain text"), "plain text");
        assert_eq!(error_message(r#"{"detail": 5}"#), r#"{"detail": 5}"#);
    }
}
