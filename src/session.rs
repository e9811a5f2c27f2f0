use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StudioError;
use crate::models::{ConfigUpdate, EncodedImage, GenerationMode, GenerationResult, ResultView, TransformationConfig};
use crate::prompt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(GenerationResult),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending { mode: GenerationMode, attempt: u64, started_at: DateTime<Utc> },
    Settled { mode: GenerationMode, outcome: Outcome },
}

/// Snapshot taken when a submission starts; the remote call works only from this.
#[derive(Debug, Clone)]
pub struct Submission {
    pub session_id: Uuid,
    pub attempt: u64,
    pub mode: GenerationMode,
    pub image: EncodedImage,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub config: TransformationConfig,
    pub image: Option<EncodedImage>,
    pub phase: Phase,
    attempts: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            config: TransformationConfig::default(),
            image: None,
            phase: Phase::Idle,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }

    pub fn can_submit(&self) -> bool {
        self.image.is_some() && !self.is_loading()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Replaces the photo and drops any previous result or error.
    pub fn ingest(&mut self, image: EncodedImage) -> Result<(), StudioError> {
        if self.is_loading() {
            return Err(StudioError::Busy);
        }
        self.image = Some(image);
        self.phase = Phase::Idle;
        self.touch();
        Ok(())
    }

    pub fn remove_image(&mut self) -> Result<(), StudioError> {
        if self.is_loading() {
            return Err(StudioError::Busy);
        }
        self.image = None;
        self.phase = Phase::Idle;
        self.touch();
        Ok(())
    }

    pub fn update_config(&mut self, update: ConfigUpdate) {
        self.config = std::mem::take(&mut self.config).apply(update);
        self.touch();
    }

    pub fn toggle_accessory(&mut self, label: &str) {
        self.config = std::mem::take(&mut self.config).toggle_accessory(label);
        self.touch();
    }

    /// Moves to `Pending` and snapshots what the remote call needs.
    pub fn begin(&mut self, mode: GenerationMode) -> Result<Submission, StudioError> {
        let image = self.image.clone().ok_or(StudioError::NoImage)?;
        if self.is_loading() {
            return Err(StudioError::Busy);
        }
        self.attempts += 1;
        self.phase = Phase::Pending { mode, attempt: self.attempts, started_at: Utc::now() };
        self.touch();
        Ok(Submission {
            session_id: self.id,
            attempt: self.attempts,
            mode,
            image,
            prompt: prompt::compose(&self.config, mode),
        })
    }

    /// Settles a submission that failed its preconditions without leaving `Idle`.
    pub fn reject(&mut self, mode: GenerationMode, message: impl Into<String>) {
        self.phase = Phase::Settled { mode, outcome: Outcome::Failure(message.into()) };
        self.touch();
    }

    /// Returns false when `attempt` is no longer the pending one.
    pub fn settle(&mut self, attempt: u64, outcome: Outcome) -> bool {
        match self.phase {
            Phase::Pending { mode, attempt: pending, .. } if pending == attempt => {
                self.phase = Phase::Settled { mode, outcome };
                self.touch();
                true
            }
            _ => false,
        }
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match &self.phase {
            Phase::Settled { outcome: Outcome::Success(result), .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Settled { outcome: Outcome::Failure(message), .. } => Some(message),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView {
        let (phase, mode) = match &self.phase {
            Phase::Idle => ("idle", None),
            Phase::Pending { mode, .. } => ("pending", Some(*mode)),
            Phase::Settled { mode, .. } => ("settled", Some(*mode)),
        };
        let result = self.result().map(|result| match result {
            GenerationResult::Text(markdown) => ResultView::Text { markdown: markdown.clone() },
            GenerationResult::Image(image) => ResultView::Image {
                mime_type: image.mime_type.clone(),
                src: image.data_uri(),
                download_url: format!("/api/session/{}/result/download", self.id),
            },
        });
        SessionView {
            id: self.id,
            config: self.config.clone(),
            has_image: self.image.is_some(),
            image_src: self.image.as_ref().map(EncodedImage::data_uri),
            phase,
            mode,
            loading: self.is_loading(),
            loading_message: match &self.phase {
                Phase::Pending { mode, .. } => Some(mode.loading_message()),
                _ => None,
            },
            can_submit: self.can_submit(),
            error: self.error().map(str::to_string),
            result,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SessionView {
    pub id: Uuid,
    pub config: TransformationConfig,
    pub has_image: bool,
    pub image_src: Option<String>,
    pub phase: &'static str,
    pub mode: Option<GenerationMode>,
    pub loading: bool,
    pub loading_message: Option<&'static str>,
    pub can_submit: bool,
    pub error: Option<String>,
    pub result: Option<ResultView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
