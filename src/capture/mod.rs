//! Image capture pipeline
//!
//! Produces a validated, JPEG-encoded still from either a live front camera
//! feed or a user-chosen file, and runs skin analysis on it. Analysis never
//! fails outward: when the vision backend errors or times out, a fixed
//! fallback result is returned instead so the wizard can move on.
//!
//! The pipeline exclusively owns an open camera feed and stops it on
//! capture, on dismissal and when dropped.

use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::api::VisionApi;
use crate::config::CaptureConfig;
use crate::error::{Result, SilError};
use crate::profile::{Analyzer, SkinAnalysis, SkinIssue};

/// What the device can do, checked once when the pipeline is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Handheld device with a native photo picker
    pub mobile: bool,
    /// A camera can be requested at all
    pub camera_available: bool,
}

/// How the pipeline acquires images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// The platform picker (file mode)
    NativePicker,
    /// A live front camera feed
    LiveStream,
}

impl CaptureStrategy {
    /// Mobile devices and devices without a camera use the picker
    pub fn resolve(capabilities: DeviceCapabilities) -> Self {
        if capabilities.mobile || !capabilities.camera_available {
            CaptureStrategy::NativePicker
        } else {
            CaptureStrategy::LiveStream
        }
    }
}

/// Source of live video
#[async_trait]
pub trait Camera: Send + Sync {
    /// Acquire the front-facing camera
    ///
    /// # Errors
    ///
    /// Fails when permission is denied or no device exists.
    async fn open_front(&self) -> Result<Box<dyn VideoFeed>>;
}

/// An acquired camera stream
#[async_trait]
pub trait VideoFeed: Send {
    /// The current frame at the feed's native resolution
    async fn current_frame(&mut self) -> Result<DynamicImage>;

    /// Stop every track and release the device
    fn stop(&mut self);
}

/// A user-chosen file, read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    /// Declared MIME type
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file, taking its MIME type from the extension
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(SilError::from)?;
        let mime = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, mime, bytes))
    }
}

/// JPEG bytes ready for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Where an analysis result came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
    Backend,
    /// Backend failed; the reason is kept for display and logs
    Fallback { reason: String },
}

/// Result of analyzing one capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub analysis: SkinAnalysis,
    pub source: AnalysisSource,
}

impl CaptureOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, AnalysisSource::Fallback { .. })
    }
}

/// Deterministic result used when the vision backend is unavailable
pub fn fallback_analysis() -> SkinAnalysis {
    SkinAnalysis {
        issues: vec![SkinIssue::Dryness, SkinIssue::DarkCircle, SkinIssue::UnevenTone],
        issue_categories: vec![
            "hydration".to_string(),
            "pigmentation".to_string(),
            "tone".to_string(),
        ],
        severity: [
            (SkinIssue::Dryness, 0.6),
            (SkinIssue::DarkCircle, 0.4),
            (SkinIssue::UnevenTone, 0.3),
        ]
        .into_iter()
        .collect(),
        hydration: Some(42.0),
        oil_level: Some(35.0),
        texture: Some("slightly rough".to_string()),
        skin_tone: Some("light warm".to_string()),
        skin_type: None,
        top_concerns: None,
        summary: None,
        analyzer: Analyzer::ClaudeVision,
    }
}

/// Encode as baseline JPEG at `quality` (1-100)
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode_image(&rgb).map_err(SilError::from)?;
    Ok(out)
}

/// Acquires, normalizes and analyzes skin photos
pub struct CapturePipeline {
    vision: Arc<dyn VisionApi>,
    analyzer: Analyzer,
    settings: CaptureConfig,
    strategy: CaptureStrategy,
    feed: Option<Box<dyn VideoFeed>>,
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("analyzer", &self.analyzer)
            .field("strategy", &self.strategy)
            .field("streaming", &self.feed.is_some())
            .finish()
    }
}

impl CapturePipeline {
    /// Create a pipeline, resolving the capture strategy from `capabilities`
    pub fn new(
        vision: Arc<dyn VisionApi>,
        analyzer: Analyzer,
        settings: CaptureConfig,
        capabilities: DeviceCapabilities,
    ) -> Self {
        let strategy = CaptureStrategy::resolve(capabilities);
        tracing::debug!(?strategy, ?capabilities, "Capture strategy resolved");
        Self {
            vision,
            analyzer,
            settings,
            strategy,
            feed: None,
        }
    }

    pub fn strategy(&self) -> CaptureStrategy {
        self.strategy
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    pub fn is_streaming(&self) -> bool {
        self.feed.is_some()
    }

    /// Open the live feed when the strategy allows it
    ///
    /// Acquisition failure is not an error for the flow: the pipeline
    /// switches to the picker and reports the strategy now in effect.
    pub async fn open_camera(&mut self, camera: &dyn Camera) -> CaptureStrategy {
        if self.strategy != CaptureStrategy::LiveStream || self.feed.is_some() {
            return self.strategy;
        }
        match camera.open_front().await {
            Ok(feed) => {
                tracing::info!("Front camera acquired");
                self.feed = Some(feed);
            }
            Err(e) => {
                tracing::warn!("Camera unavailable, switching to file mode: {:#}", e);
                self.strategy = CaptureStrategy::NativePicker;
            }
        }
        self.strategy
    }

    /// Grab the current frame, release the camera and encode the frame
    ///
    /// The frame is encoded at its native resolution. If grabbing the frame
    /// fails the feed stays open so the user can retry.
    pub async fn capture_frame(&mut self) -> Result<EncodedImage> {
        let feed = self
            .feed
            .as_mut()
            .ok_or_else(|| SilError::Capture("No camera feed is open".to_string()))?;
        let frame = feed.current_frame().await?;
        self.release();

        let (width, height) = (frame.width(), frame.height());
        let bytes = encode_jpeg(&frame, self.settings.jpeg_quality)?;
        tracing::debug!(width, height, bytes = bytes.len(), "Frame captured");
        Ok(EncodedImage {
            bytes,
            width,
            height,
        })
    }

    /// Close the capture view without taking a photo
    pub fn dismiss(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
            tracing::debug!("Camera feed released");
        }
    }

    /// Reject oversized or non-image files before any decoding
    ///
    /// # Errors
    ///
    /// Returns [`SilError::Validation`] naming the violated limit.
    pub fn validate_file(&self, file: &ImageFile) -> Result<()> {
        let size = file.bytes.len() as u64;
        if size > self.settings.max_file_bytes {
            return Err(SilError::Validation(format!(
                "{} is {} bytes; the limit is {} bytes",
                file.name, size, self.settings.max_file_bytes
            ))
            .into());
        }
        if !file.mime.starts_with("image/") {
            return Err(SilError::Validation(format!(
                "{} is not an image ({})",
                file.name, file.mime
            ))
            .into());
        }
        Ok(())
    }

    /// Validate, decode, bound and re-encode a chosen file
    pub fn prepare_file(&self, file: &ImageFile) -> Result<EncodedImage> {
        self.validate_file(file)?;

        let mut image = image::load_from_memory(&file.bytes).map_err(SilError::from)?;
        let max = self.settings.max_dimension;
        if image.width() > max || image.height() > max {
            tracing::debug!(
                width = image.width(),
                height = image.height(),
                max,
                "Downscaling image"
            );
            image = image.resize(max, max, FilterType::Triangle);
        }

        let bytes = encode_jpeg(&image, self.settings.jpeg_quality)?;
        Ok(EncodedImage {
            bytes,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Analyze an encoded image, substituting the fallback on any failure
    pub async fn analyze(&self, image: &EncodedImage) -> CaptureOutcome {
        match self.vision.analyze_skin(&image.bytes, self.analyzer).await {
            Ok(analysis) => {
                tracing::info!(issues = analysis.issues.len(), "Skin analysis complete");
                CaptureOutcome {
                    analysis,
                    source: AnalysisSource::Backend,
                }
            }
            Err(e) => {
                let timed_out = crate::error::classify(&e).is_some_and(SilError::is_timeout);
                tracing::warn!(timed_out, "Skin analysis failed, using fallback: {:#}", e);
                CaptureOutcome {
                    analysis: fallback_analysis(),
                    source: AnalysisSource::Fallback {
                        reason: format!("{:#}", e),
                    },
                }
            }
        }
    }

    /// File mode end to end
    ///
    /// # Errors
    ///
    /// Only local problems surface: validation failures (no network call is
    /// made) and undecodable images.
    pub async fn analyze_file(&self, file: &ImageFile) -> Result<CaptureOutcome> {
        let image = self.prepare_file(file)?;
        Ok(self.analyze(&image).await)
    }

    /// Live mode end to end
    pub async fn capture_and_analyze(&mut self) -> Result<CaptureOutcome> {
        let image = self.capture_frame().await?;
        Ok(self.analyze(&image).await)
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.release();
    }
}
