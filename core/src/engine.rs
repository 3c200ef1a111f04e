//! Request execution engine.
//!
//! # Design
//! `Engine` owns one session: the validated `Settings`, a `Transport`, and the
//! shared `SessionState` (last dispatch time and request counter). Every call
//! runs the same pipeline:
//!
//! ```text
//! execute(descriptor)
//!     → throttle      (wait until MIN_REQUEST_SPACING since the last call)
//!     → build_request (URL, query, headers, JSON body)
//!     → attempt loop  (timeout per attempt, count every dispatch)
//!         2xx          → decode and return
//!         4xx          → return immediately
//!         5xx/network  → sleep retry_delay * 2^n, try again
//! ```
//!
//! The last-dispatch timestamp is stamped once per `execute`, before the
//! attempt loop, so retries inside one call are paced by backoff alone.
//! Concurrent `execute` calls are not serialized: each reads and stamps the
//! timestamp on its own, which makes the spacing best-effort under
//! concurrency. The session lock is never held across an `.await`.
//!
//! All timing goes through `tokio::time`, so tests drive the engine with a
//! paused clock instead of real sleeps.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, Instrument};
use url::Url;
use uuid::Uuid;

use crate::error::{ClientError, ErrorBody};
use crate::http::{HttpRequest, HttpResponse};
use crate::request::RequestDescriptor;
use crate::settings::Settings;
use crate::transport::{ReqwestTransport, Transport};

/// Minimum spacing between two `execute` calls on one engine.
pub const MIN_REQUEST_SPACING: Duration = Duration::from_millis(100);

/// Lightweight endpoint used by the connectivity probe.
pub const ABOUT_PATH: &str = "/api/v1/about";

pub const USER_AGENT: &str = concat!(
    "firefly-rs/",
    env!("CARGO_PKG_VERSION"),
    " (Compatible with Firefly III v6.x)"
);

const JSON_CONTENT_TYPE: &str = "application/json";
const JSON_API_ACCEPT: &str = "application/vnd.api+json";

/// Mutable per-session bookkeeping.
#[derive(Debug, Default)]
struct SessionState {
    last_request: Option<Instant>,
    request_count: u64,
}

/// Executes request descriptors against one Firefly III server.
pub struct Engine<T = ReqwestTransport> {
    settings: Settings,
    transport: T,
    session: Mutex<SessionState>,
}

impl Engine<ReqwestTransport> {
    /// Engine with a real HTTP transport.
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        Ok(Self::with_transport(settings, ReqwestTransport::new()?))
    }
}

impl<T: Transport> Engine<T> {
    pub fn with_transport(settings: Settings, transport: T) -> Self {
        Self {
            settings,
            transport,
            session: Mutex::new(SessionState::default()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Total dispatch attempts made through this engine, failed ones included.
    pub fn request_count(&self) -> u64 {
        self.session().request_count
    }

    /// When the most recent `execute` passed the rate-limit gate.
    pub fn last_request_at(&self) -> Option<Instant> {
        self.session().last_request
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one logical API call and decode a 2xx body as `R`.
    pub async fn execute<R: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<R, ClientError> {
        let span = tracing::debug_span!(
            "execute",
            request_id = %Uuid::new_v4(),
            method = %descriptor.method(),
            path = descriptor.path(),
        );
        self.execute_inner(descriptor).instrument(span).await
    }

    async fn execute_inner<R: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<R, ClientError> {
        self.throttle().await;
        let request = self.build_request(descriptor)?;

        let max_attempts = self.settings.retry_attempts.saturating_add(1);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            let err = match self.attempt::<R>(&request).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt + 1 < max_attempts {
                let delay = backoff_delay(self.settings.retry_delay, attempt);
                if self.settings.debug {
                    debug!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                }
                last_error = Some(err);
                sleep(delay).await;
            } else {
                last_error = Some(err);
            }
        }

        Err(last_error.unwrap_or(ClientError::RetriesExhausted))
    }

    /// Wait out the remainder of `MIN_REQUEST_SPACING`, then stamp the session.
    async fn throttle(&self) {
        let wait = {
            let session = self.session();
            session
                .last_request
                .map(|last| MIN_REQUEST_SPACING.saturating_sub(last.elapsed()))
                .unwrap_or_default()
        };
        if !wait.is_zero() {
            if self.settings.debug {
                debug!(wait_ms = wait.as_millis() as u64, "rate limiting request");
            }
            sleep(wait).await;
        }
        self.session().last_request = Some(Instant::now());
    }

    /// One dispatch under the attempt deadline. Counts the attempt whatever
    /// the outcome.
    async fn attempt<R: DeserializeOwned>(&self, request: &HttpRequest) -> Result<R, ClientError> {
        if self.settings.debug {
            debug!(method = %request.method, url = %request.url, "dispatching request");
        }

        let outcome = timeout(self.settings.timeout, self.transport.send(request)).await;
        self.session().request_count += 1;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(ClientError::Timeout {
                    after: self.settings.timeout,
                })
            }
        };

        if self.settings.debug {
            debug!(
                status = response.status,
                bytes = response.body.len(),
                "received response"
            );
        }
        parse_response(response)
    }

    /// Resolve a descriptor into a concrete request for this session.
    pub fn build_request(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest, ClientError> {
        let mut url = resolve_url(&self.settings.base_url, descriptor.path(), descriptor.segments())?;
        if !descriptor.params().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in descriptor.params() {
                pairs.append_pair(key, &value.to_string());
            }
        }

        let headers = vec![
            ("authorization".to_string(), format!("Bearer {}", self.settings.token)),
            ("content-type".to_string(), JSON_CONTENT_TYPE.to_string()),
            ("accept".to_string(), JSON_API_ACCEPT.to_string()),
            ("user-agent".to_string(), USER_AGENT.to_string()),
        ];

        let body = match descriptor.body() {
            Some(body) if descriptor.method().carries_body() => {
                Some(serde_json::to_string(body).map_err(|e| ClientError::InvalidRequest {
                    message: format!("body serialization failed: {e}"),
                })?)
            }
            _ => None,
        };

        Ok(HttpRequest {
            method: descriptor.method(),
            url: url.into(),
            headers,
            body,
        })
    }

    /// Connectivity probe: `GET /api/v1/about`, reporting only success.
    ///
    /// Never returns an error; the failure cause is logged instead.
    pub async fn test_connection(&self) -> bool {
        match self
            .execute::<serde_json::Value>(&RequestDescriptor::get(ABOUT_PATH))
            .await
        {
            Ok(_) => {
                info!(url = %self.settings.base_url, "connection to Firefly III verified");
                true
            }
            Err(err) => {
                error!(url = %self.settings.base_url, error = %err, "connection test failed");
                false
            }
        }
    }
}

/// Exponential backoff: `base * 2^attempt`, saturating.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Join `path` onto the base URL, keeping any path prefix the base carries
/// (e.g. a server hosted under `/firefly`), then append `segments` one
/// percent-encoded segment each.
fn resolve_url(base: &Url, path: &str, segments: &[String]) -> Result<Url, ClientError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|e| ClientError::InvalidRequest {
        message: format!("invalid URL {joined:?}: {e}"),
    })?;
    if segments.is_empty() {
        return Ok(url);
    }

    // `.` and `..` would be dropped by the URL parser and silently change
    // the endpoint.
    if let Some(bad) = segments.iter().find(|s| matches!(s.as_str(), "" | "." | "..")) {
        return Err(ClientError::InvalidRequest {
            message: format!("invalid path segment {bad:?}"),
        });
    }
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidRequest {
            message: format!("URL {joined:?} cannot take path segments"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Classify a response: decode 2xx bodies as `R`, turn anything else into
/// `ClientError::Api`.
pub fn parse_response<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ClientError> {
    check_status(&response)?;
    // 204 and friends: let `()` and `Option<_>` decode from an empty body.
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        message: e.to_string(),
    })
}

fn check_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.is_success() {
        return Ok(());
    }
    let detail = serde_json::from_str::<ErrorBody>(&response.body).ok();
    let message = match &detail {
        Some(body) if !body.message.trim().is_empty() => body.message.clone(),
        _ => format!("HTTP {}: {}", response.status, response.status_text),
    };
    Err(ClientError::Api {
        status: response.status,
        message,
        detail,
    })
}
