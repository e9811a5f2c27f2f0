use tracing::{error, info};

use crate::config::Settings;
use crate::gemini::{GeminiError, GeminiGenerationResult, GenerationBackend, GenerationRequest};
use crate::models::{GenerationMode, GenerationResult};
use crate::session::{Outcome, Submission};

pub const RETRY_LATER: &str = "Tente novamente mais tarde.";
pub const NO_IMAGE_GENERATED: &str = "Não foi possível gerar a imagem. Tente novamente.";
pub const EMPTY_GUIDE: &str = "A IA não retornou nenhum roteiro. Tente novamente.";

pub fn model_for(settings: &Settings, mode: GenerationMode) -> &str {
    match mode {
        GenerationMode::Analyze => &settings.text_model,
        GenerationMode::Transform => &settings.image_model,
    }
}

/// `"<label>: <message>"`, with the retry hint standing in for a blank message.
pub fn failure_message(mode: GenerationMode, underlying: &str) -> String {
    let underlying = underlying.trim();
    let underlying = if underlying.is_empty() { RETRY_LATER } else { underlying };
    format!("{}: {}", mode.error_label(), underlying)
}

fn interpret(mode: GenerationMode, response: GeminiGenerationResult) -> Result<GenerationResult, GeminiError> {
    match mode {
        GenerationMode::Analyze => {
            let text = response.text();
            if text.is_empty() {
                Err(GeminiError::Malformed(EMPTY_GUIDE.into()))
            } else {
                Ok(GenerationResult::Text(text))
            }
        }
        GenerationMode::Transform => response
            .image
            .map(GenerationResult::Image)
            .ok_or_else(|| GeminiError::Malformed(NO_IMAGE_GENERATED.into())),
    }
}

/// One best-effort remote call; every failure comes back as `Outcome::Failure`.
pub async fn execute(backend: &dyn GenerationBackend, settings: &Settings, submission: &Submission) -> Outcome {
    let model = model_for(settings, submission.mode);
    info!(
        "🎯 {:?} for session {} (attempt {}) with {}, prompt (truncated): {}",
        submission.mode,
        submission.session_id,
        submission.attempt,
        model,
        submission.prompt.chars().take(120).collect::<String>()
    );

    let request = GenerationRequest {
        model,
        image: &submission.image,
        prompt: &submission.prompt,
        want_image: submission.mode == GenerationMode::Transform,
    };
    let result = backend
        .generate(request)
        .await
        .and_then(|response| interpret(submission.mode, response));

    match result {
        Ok(result) => {
            info!("✅ {:?} succeeded for session {}", submission.mode, submission.session_id);
            Outcome::Success(result)
        }
        Err(e) => {
            error!("❌ {:?} failed for session {}: {}", submission.mode, submission.session_id, e);
            Outcome::Failure(failure_message(submission.mode, &e.to_string()))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;
    use crate::models::EncodedImage;
    use crate::session::Session;
    use pretty_assertions::assert_eq;

    fn submission(mode: GenerationMode) -> Submission {
        let mut session = Session::new();
        session
            .ingest(EncodedImage { mime_type: "image/jpeg".into(), data: "QQ==".into() })
            .unwrap();
        session.begin(mode).unwrap()
    }

    #[tokio::test]
    async fn missing_inline_image_is_a_failure() {
        let backend = ScriptedBackend::replying(Ok(GeminiGenerationResult {
            image: None,
            texts: vec!["Desculpe, não consigo.".into()],
        }));
        let outcome = execute(&backend, &Settings::default(), &submission(GenerationMode::Transform)).await;
        assert_eq!(outcome, Outcome::Failure(format!("Erro na transformação: {NO_IMAGE_GENERATED}")));
    }

    #[tokio::test]
    async fn image_mode_uses_image_model() {
        let image = EncodedImage { mime_type: "image/png".into(), data: "QQ==".into() };
        let backend = ScriptedBackend::replying(Ok(GeminiGenerationResult { image: Some(image.clone()), texts: vec![] }));
        let outcome = execute(&backend, &Settings::default(), &submission(GenerationMode::Transform)).await;
        assert_eq!(outcome, Outcome::Success(GenerationResult::Image(image)));
        let seen = backend.seen.lock();
        assert_eq!(seen[0].0, crate::config::DEFAULT_IMAGE_MODEL);
        assert!(seen[0].2);
    }

    #[tokio::test]
    async fn text_mode_returns_guide() {
        let backend = ScriptedBackend::replying(Ok(GeminiGenerationResult {
            image: None,
            texts: vec!["1. **Análise de Biotipo**\n  ombros largos".into()],
        }));
        let outcome = execute(&backend, &Settings::default(), &submission(GenerationMode::Analyze)).await;
        assert_eq!(
            outcome,
            Outcome::Success(GenerationResult::Text("1. **Análise de Biotipo**\n  ombros largos".into()))
        );
        let seen = backend.seen.lock();
        assert_eq!(seen[0].0, crate::config::DEFAULT_TEXT_MODEL);
        assert!(!seen[0].2);
    }

    #[tokio::test]
    async fn remote_error_is_prefixed() {
        let backend = ScriptedBackend::replying(Err(GeminiError::Api("Quota exceeded".into())));
        let outcome = execute(&backend, &Settings::default(), &submission(GenerationMode::Analyze)).await;
        assert_eq!(outcome, Outcome::Failure("Erro na consultoria: Quota exceeded".into()));
    }

    #[test]
    fn blank_message_defaults_to_retry() {
        assert_eq!(failure_message(GenerationMode::Analyze, " "), "Erro na consultoria: Tente novamente mais tarde.");
    }
}
