//! HTTP client for the SIL backend
//!
//! [`ApiClient`] wraps every outbound call: JSON request/response calls,
//! the time-bounded vision analysis call, and the streamed consult call.
//! It classifies failures into [`SilError`] variants and returns them;
//! it never retries and never substitutes fallback data.
//!
//! The traits [`VisionApi`], [`ConsultApi`] and [`WeatherApi`] are the
//! seams the capture pipeline, chat controller and environment step depend
//! on, so each can be driven by a fake in tests.

pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{Result, SilError};
use crate::language::Language;
use crate::profile::{Analyzer, SkinAnalysis, WeatherData};

pub use sse::{ConsultStream, SseDecoder, SseEvent};
pub use types::{
    AnalyzeRequest, CityInfo, ConsultRequest, ConsultResponse, HealthStatus, HistoryEntry,
    PersonaInfo, Season, SkinDiaryEntry, WeatherQuery,
};

use types::ConsultPayload;

/// Client-side deadline for skin analysis
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(45);

/// Vision analysis seam
#[async_trait]
pub trait VisionApi: Send + Sync {
    /// Analyze an encoded image
    ///
    /// # Errors
    ///
    /// Returns [`SilError::Timeout`] when the analysis deadline expires.
    async fn analyze_skin(&self, image: &[u8], analyzer: Analyzer) -> Result<SkinAnalysis>;
}

/// Chat consultation seam
#[async_trait]
pub trait ConsultApi: Send + Sync {
    /// One complete reply
    async fn consult(&self, request: &ConsultRequest) -> Result<ConsultResponse>;

    /// Open a streamed reply
    ///
    /// # Errors
    ///
    /// Returns [`SilError::Stream`] if the server does not accept the stream.
    async fn consult_stream(&self, request: &ConsultRequest) -> Result<ConsultStream>;
}

/// Weather lookup seam
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherData>;
}

/// SIL backend client
///
/// # Examples
///
/// ```no_run
/// use sil_consult::api::{ApiClient, WeatherApi, WeatherQuery};
/// use sil_consult::config::ApiConfig;
///
/// # async fn example() -> sil_consult::error::Result<()> {
/// let client = ApiClient::new(&ApiConfig::default())?;
/// let weather = client.get_weather(&WeatherQuery::coordinates(37.56, 126.97)).await?;
/// println!("{} °C in {}", weather.temp, weather.city);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    analyze_timeout: Duration,
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// No network I/O happens here. The request timeout applies to JSON
    /// calls only; streamed replies are bounded by the transport.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SilError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            analyze_timeout: Duration::from_secs(config.analyze_timeout_seconds),
        })
    }

    /// Build a client for `base_url` with default timeouts
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(&config)
    }

    /// Override the analysis deadline
    pub fn with_analyze_timeout(mut self, timeout: Duration) -> Self {
        self.analyze_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a JSON call and decode a 2xx body
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("SIL request failed: {}", e);
                SilError::from_reqwest(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("SIL backend returned error {}: {}", status, body);
            return Err(SilError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let text = response.text().await.map_err(|e| SilError::from_reqwest(&e))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse SIL response: {}", e);
            SilError::InvalidResponse(e.to_string()).into()
        })
    }

    /// `GET /api/personas?lang=`
    pub async fn get_personas(&self, language: Language) -> Result<Vec<PersonaInfo>> {
        tracing::debug!(lang = %language, "Fetching personas");
        let request = self
            .http
            .get(self.endpoint("/api/personas"))
            .query(&[("lang", language.code())])
            .timeout(self.request_timeout);
        self.send_json(request).await
    }

    /// `GET /api/cities?lang=`
    pub async fn get_cities(&self, language: Language) -> Result<Vec<CityInfo>> {
        tracing::debug!(lang = %language, "Fetching cities");
        let request = self
            .http
            .get(self.endpoint("/api/cities"))
            .query(&[("lang", language.code())])
            .timeout(self.request_timeout);
        self.send_json(request).await
    }

    /// `GET /api/diary`
    pub async fn get_diary(&self) -> Result<Vec<SkinDiaryEntry>> {
        let request = self
            .http
            .get(self.endpoint("/api/diary"))
            .timeout(self.request_timeout);
        self.send_json(request).await
    }

    /// `POST /api/diary`, returning the stored entry
    pub async fn add_diary_entry(&self, entry: &SkinDiaryEntry) -> Result<SkinDiaryEntry> {
        tracing::debug!(date = %entry.date, "Adding diary entry");
        let request = self
            .http
            .post(self.endpoint("/api/diary"))
            .json(entry)
            .timeout(self.request_timeout);
        self.send_json(request).await
    }

    /// `GET /api/health`
    pub async fn health_check(&self) -> Result<HealthStatus> {
        let request = self
            .http
            .get(self.endpoint("/api/health"))
            .timeout(self.request_timeout);
        self.send_json(request).await
    }
}

#[async_trait]
impl VisionApi for ApiClient {
    async fn analyze_skin(&self, image: &[u8], analyzer: Analyzer) -> Result<SkinAnalysis> {
        let body = AnalyzeRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image),
            analyzer,
        };
        tracing::debug!(
            analyzer = %analyzer,
            image_bytes = image.len(),
            "Sending skin analysis request"
        );

        let request = self.http.post(self.endpoint("/api/analyze-skin")).json(&body);

        // Dropping the in-flight future on expiry aborts the request.
        match tokio::time::timeout(self.analyze_timeout, self.send_json(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Skin analysis exceeded {}s deadline, request aborted",
                    self.analyze_timeout.as_secs()
                );
                Err(SilError::Timeout(format!(
                    "Analysis timed out after {} seconds",
                    self.analyze_timeout.as_secs()
                ))
                .into())
            }
        }
    }
}

#[async_trait]
impl ConsultApi for ApiClient {
    async fn consult(&self, request: &ConsultRequest) -> Result<ConsultResponse> {
        tracing::debug!(
            history = request.history.len(),
            lang = %request.language,
            "Sending consult request"
        );
        let payload = ConsultPayload {
            request,
            stream: None,
        };
        let builder = self
            .http
            .post(self.endpoint("/api/consult"))
            .json(&payload)
            .timeout(self.request_timeout);
        self.send_json(builder).await
    }

    async fn consult_stream(&self, request: &ConsultRequest) -> Result<ConsultStream> {
        tracing::debug!(
            history = request.history.len(),
            lang = %request.language,
            "Opening consult stream"
        );
        let payload = ConsultPayload {
            request,
            stream: Some(true),
        };
        let response = self
            .http
            .post(self.endpoint("/api/consult"))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Consult stream request failed: {}", e);
                SilError::from_reqwest(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Consult stream refused with status {}", status);
            return Err(SilError::Stream(format!("HTTP {}", status.as_u16())).into());
        }

        Ok(ConsultStream::from_bytes(response.bytes_stream()))
    }
}

#[async_trait]
impl WeatherApi for ApiClient {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherData> {
        let pairs = query.to_query_pairs();
        tracing::debug!(?pairs, "Fetching weather");
        let request = self
            .http
            .get(self.endpoint("/api/weather"))
            .query(&pairs)
            .timeout(self.request_timeout);
        self.send_json(request).await
    }
}
