//! Blocking HTTP client shared by the network providers
//!
//! Every request uses one `ureq` agent with a global timeout and the optional
//! configured proxy. Transient failures (timeouts, connection errors, 429 and
//! 5xx) are retried with exponential backoff.

use primer_core::{Credential, PrimerError, Result};
use std::io::Read;
use std::time::Duration;

const MAX_RETRIES: usize = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// A header name/value pair
pub type Header<'a> = (&'a str, &'a str);

pub struct HttpClient {
    agent: ureq::Agent,
    /// Provider name, for error messages
    label: String,
}

impl HttpClient {
    pub fn new(label: &str, timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = ureq::Agent::config_builder().timeout_global(Some(timeout));

        if let Some(url) = proxy {
            let proxy = ureq::Proxy::new(url).map_err(|e| {
                PrimerError::ConfigurationError(format!("invalid proxy '{}': {}", url, e))
            })?;
            builder = builder.proxy(Some(proxy));
        }

        Ok(Self {
            agent: builder.build().into(),
            label: label.to_string(),
        })
    }

    /// POST a JSON payload with bearer auth and parse the JSON reply
    pub fn post_json(
        &self,
        url: &str,
        credential: &Credential,
        headers: &[Header<'_>],
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.with_retry("request", || {
            let mut request = self
                .agent
                .post(url)
                .header("Authorization", &credential.bearer())
                .header("Content-Type", "application/json");
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            request.send_json(payload)
        })
        .and_then(|mut ok| {
            ok.body_mut().read_json().map_err(|e| {
                PrimerError::GenerationFailure(format!(
                    "failed to parse {} response: {}",
                    self.label, e
                ))
            })
        })
    }

    /// GET with bearer auth and parse the JSON reply
    pub fn get_json(
        &self,
        url: &str,
        credential: &Credential,
        headers: &[Header<'_>],
    ) -> Result<serde_json::Value> {
        self.with_retry("poll", || {
            let mut request = self
                .agent
                .get(url)
                .header("Authorization", &credential.bearer());
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            request.call()
        })
        .and_then(|mut ok| {
            ok.body_mut().read_json().map_err(|e| {
                PrimerError::GenerationFailure(format!(
                    "failed to parse {} poll response: {}",
                    self.label, e
                ))
            })
        })
    }

    /// GET raw bytes, with bearer auth when a credential is given
    pub fn get_bytes(&self, url: &str, credential: Option<&Credential>) -> Result<Vec<u8>> {
        let ok = self.with_retry("download", || {
            let mut request = self.agent.get(url);
            if let Some(credential) = credential {
                request = request.header("Authorization", &credential.bearer());
            }
            request.call()
        })?;

        let mut reader = ok.into_body().into_reader();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| {
            PrimerError::GenerationFailure(format!("failed to read {} download: {}", self.label, e))
        })?;
        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    fn with_retry<F>(&self, what: &str, mut send: F) -> Result<ureq::http::Response<ureq::Body>>
    where
        F: FnMut() -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    {
        let mut attempt = 0;
        loop {
            match send() {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt + 1 < MAX_RETRIES && is_retryable_error(&e) {
                        log::debug!("{} {} failed ({}), retrying", self.label, what, e);
                        sleep_backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(PrimerError::GenerationFailure(format!(
                        "{} {} failed: {}",
                        self.label, what, e
                    )));
                }
            }
        }
    }
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt);
    std::thread::sleep(Duration::from_millis(delay_ms));
}

/// Drop one trailing `/` so paths can be appended with `format!("{}/...")`
pub fn trim_base(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}
