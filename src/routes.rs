use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    catalog::{option_catalog, OptionCatalog},
    config::Settings,
    error::{StudioError, MISSING_API_KEY_MESSAGE},
    gemini::GenerationBackend,
    generation,
    models::{ConfigUpdate, EncodedImage, GenerationMode, GenerationResult, ToggleAccessoryRequest},
    pdf::generate_pdf,
    session::{Outcome, Session, SessionView},
};

pub const DOWNLOAD_BASENAME: &str = "look-viral";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub gemini: Arc<dyn GenerationBackend>,
    pub settings: Arc<Settings>,
}

pub fn router(state: AppState) -> Router {
    let upload_limit = state.settings.max_upload_bytes;
    Router::new()
        .route("/api/options", get(list_options))
        .route("/api/session", post(create_session))
        .route("/api/session/:id", get(get_session).delete(delete_session))
        .route("/api/session/:id/image", post(upload_image).delete(remove_image))
        .route("/api/session/:id/config", put(update_config))
        .route("/api/session/:id/accessories/toggle", post(toggle_accessory))
        .route("/api/session/:id/analyze", post(analyze))
        .route("/api/session/:id/transform", post(transform))
        .route("/api/session/:id/result", get(get_result))
        .route("/api/session/:id/result/download", get(download_result))
        .route("/api/session/:id/result/pdf", get(export_pdf))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

fn with_session<T>(state: &AppState, id: Uuid, f: impl FnOnce(&mut Session) -> Result<T, StudioError>) -> Result<T, StudioError> {
    let mut guard = state.store.write();
    let session = guard.get_mut(&id).ok_or(StudioError::SessionNotFound(id))?;
    f(session)
}

fn read_session(state: &AppState, id: Uuid) -> Result<Session, StudioError> {
    state.store.read().get(&id).cloned().ok_or(StudioError::SessionNotFound(id))
}

pub async fn list_options() -> Json<OptionCatalog> {
    Json(option_catalog())
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let session = Session::new();
    let view = session.view();
    tracing::info!("🆕 Created session {}", session.id);
    state.store.write().insert(session.id, session);
    (StatusCode::CREATED, Json(view))
}

pub async fn get_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, StudioError> {
    Ok(Json(read_session(&state, id)?.view()))
}

/// Drops the session with its photo and result. An in-flight generation settles into nothing.
pub async fn delete_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<StatusCode, StudioError> {
    state.store.write().remove(&id).ok_or(StudioError::SessionNotFound(id))?;
    tracing::info!("🗑️ Deleted session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Removes sessions untouched since `now - ttl`, keeping any with a generation pending.
pub fn evict_idle_sessions(state: &AppState, now: DateTime<Utc>) -> usize {
    let Some(cutoff) = now.checked_sub_signed(state.settings.session_ttl) else {
        return 0;
    };
    let mut guard = state.store.write();
    let before = guard.len();
    guard.retain(|_, session| session.is_loading() || session.updated_at >= cutoff);
    let evicted = before - guard.len();
    if evicted > 0 {
        tracing::info!("🧹 Evicted {} idle sessions, {} remain", evicted, guard.len());
    }
    evicted
}

/// Media type for an upload: the declared `image/*` type, else sniffed from the bytes.
fn upload_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    match declared {
        Some(mime) if mime.starts_with("image/") => mime.to_string(),
        _ => image::guess_format(bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string()),
    }
}

pub async fn upload_image(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, StudioError> {
    if !state.store.read().contains_key(&id) {
        return Err(StudioError::SessionNotFound(id));
    }

    let mut photo: Option<EncodedImage> = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("photo") => {
                let declared = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                let mime_type = upload_mime(declared.as_deref(), &bytes);
                photo = Some(EncodedImage::from_bytes(mime_type, &bytes));
            }
            // Pages that already hold the FileReader output send it as is.
            Some("photo_data_uri") => {
                let uri = field.text().await?;
                if uri.trim().is_empty() {
                    continue;
                }
                let image = EncodedImage::parse_data_uri(uri.trim())
                    .ok_or_else(|| StudioError::BadRequest("photo_data_uri is not a base64 data URI".into()))?;
                photo = Some(image);
            }
            _ => {}
        }
    }

    let view = with_session(&state, id, |session| {
        match photo {
            Some(image) => {
                tracing::info!("📷 Session {} ingested {} photo ({} base64 chars)", id, image.mime_type, image.data.len());
                session.ingest(image)?;
            }
            None => tracing::info!("📭 Session {} upload carried no photo, ignoring", id),
        }
        Ok(session.view())
    })?;
    Ok(Json(view))
}

pub async fn remove_image(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, StudioError> {
    let view = with_session(&state, id, |session| {
        session.remove_image()?;
        Ok(session.view())
    })?;
    Ok(Json(view))
}

pub async fn update_config(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ConfigUpdate>,
) -> Result<Json<SessionView>, StudioError> {
    let view = with_session(&state, id, |session| {
        session.update_config(body);
        Ok(session.view())
    })?;
    Ok(Json(view))
}

pub async fn toggle_accessory(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ToggleAccessoryRequest>,
) -> Result<Json<SessionView>, StudioError> {
    let label = body.label.trim();
    if label.is_empty() {
        return Err(StudioError::BadRequest("accessory label must not be empty".into()));
    }
    let view = with_session(&state, id, |session| {
        session.toggle_accessory(label);
        Ok(session.view())
    })?;
    Ok(Json(view))
}

pub async fn analyze(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, StudioError> {
    submit(state, id, GenerationMode::Analyze).await.map(Json)
}

pub async fn transform(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, StudioError> {
    submit(state, id, GenerationMode::Transform).await.map(Json)
}

async fn submit(state: AppState, id: Uuid, mode: GenerationMode) -> Result<SessionView, StudioError> {
    let credentials = state.gemini.has_credentials();
    let submission = with_session(&state, id, |session| {
        if !session.can_submit() {
            return Err(if session.is_loading() { StudioError::Busy } else { StudioError::NoImage });
        }
        if !credentials {
            session.reject(mode, MISSING_API_KEY_MESSAGE);
            return Err(StudioError::MissingCredential);
        }
        session.begin(mode)
    })?;

    // The call and the settle run on their own task so a dropped request cannot leave the session pending.
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        let outcome = generation::execute(task_state.gemini.as_ref(), &task_state.settings, &submission).await;
        if let Some(session) = task_state.store.write().get_mut(&submission.session_id) {
            session.settle(submission.attempt, outcome);
        }
    });

    if let Err(e) = task.await {
        tracing::error!("❌ Generation task for session {} aborted: {}", id, e);
        let mut guard = state.store.write();
        if let Some(session) = guard.get_mut(&id) {
            if let crate::session::Phase::Pending { attempt, .. } = session.phase {
                session.settle(attempt, Outcome::Failure(generation::failure_message(mode, "")));
            }
        }
    }

    Ok(read_session(&state, id)?.view())
}

fn settled_result(state: &AppState, id: Uuid) -> Result<(Session, GenerationResult), StudioError> {
    let session = read_session(state, id)?;
    let result = session
        .result()
        .cloned()
        .ok_or_else(|| StudioError::NoResult("nenhum resultado disponível".into()))?;
    Ok((session, result))
}

fn decode_image(image: &EncodedImage) -> Result<Vec<u8>, StudioError> {
    image.decode().map_err(|e| StudioError::Internal(format!("invalid image payload: {}", e)))
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

pub async fn get_result(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Response, StudioError> {
    let (_, result) = settled_result(&state, id)?;
    Ok(match result {
        GenerationResult::Text(markdown) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/markdown; charset=utf-8"))],
            markdown,
        )
            .into_response(),
        GenerationResult::Image(image) => {
            let bytes = decode_image(&image)?;
            ([(header::CONTENT_TYPE, header_value(&image.mime_type))], bytes).into_response()
        }
    })
}

pub async fn download_result(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Response, StudioError> {
    let (_, result) = settled_result(&state, id)?;
    let GenerationResult::Image(image) = result else {
        return Err(StudioError::NoResult("nenhuma imagem para baixar".into()));
    };
    let bytes = decode_image(&image)?;
    let disposition = format!("attachment; filename=\"{}.{}\"", DOWNLOAD_BASENAME, image.file_extension());
    tracing::info!("⬇️ Session {} downloading {} ({} bytes)", id, image.mime_type, bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, header_value(&image.mime_type)),
            (header::CONTENT_DISPOSITION, header_value(&disposition)),
        ],
        bytes,
    )
        .into_response())
}

pub async fn export_pdf(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Response, StudioError> {
    let (session, result) = settled_result(&state, id)?;
    let GenerationResult::Text(guide) = result else {
        return Err(StudioError::NoResult("nenhum roteiro para exportar".into()));
    };
    let pdf_bytes = generate_pdf(&session.config, &guide).map_err(|e| StudioError::Internal(e.to_string()))?;
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_DISPOSITION, header_value(&format!("attachment; filename=\"roteiro_{}.pdf\"", id)));
    Ok((StatusCode::OK, headers, pdf_bytes).into_response())
}
