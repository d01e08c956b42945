//! Web front-end: one form, one answer.
//!
//! - `GET  /`       — the study form
//! - `POST /`       — multipart form (`mode`, `question`, `pdf`, `image`) → answer page
//! - `GET  /health` — liveness probe
//!
//! The body ceiling (10 MiB by default) is applied with
//! [`DefaultBodyLimit`], so an oversize upload fails while the form is read
//! and is rendered inline like every per-request [`crate::StudyError`]; the
//! student never sees a bare error page.
//!
//! Build with the `server` feature (on by default).

use crate::request::{Mode, StudyRequest, Upload};
use crate::tutor::Tutor;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the application router around a shared tutor.
pub fn router(tutor: Arc<Tutor>) -> Router {
    let limit = tutor.config().max_upload_bytes;
    Router::new()
        .route("/", get(form).post(ask))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(tutor)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(tutor: Arc<Tutor>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(tutor)).await
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, format!("ok {}", env!("CARGO_PKG_VERSION")))
}

async fn form() -> Html<String> {
    Html(render_page(&PageView::default()))
}

async fn ask(State(tutor): State<Arc<Tutor>>, multipart: Multipart) -> Html<String> {
    let limit = tutor.config().max_upload_bytes;
    let request = match read_form(multipart).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected form: {}", e);
            return Html(render_page(&PageView {
                error: form_error_message(&e, limit),
                ..PageView::default()
            }));
        }
    };

    let mut view = PageView {
        mode: request.mode,
        question: request.question.clone(),
        ..PageView::default()
    };

    match tutor.answer(request).await {
        Ok(answer) => view.answer = answer.markup,
        Err(e) => {
            if !e.is_request_error() {
                warn!("Unexpected error while answering: {}", e);
            }
            view.error = e.to_string();
        }
    }
    Html(render_page(&view))
}

/// Collect the multipart fields into a [`StudyRequest`].
///
/// Unknown fields are ignored; a missing `mode` means explain.
async fn read_form(mut multipart: Multipart) -> Result<StudyRequest, FormError> {
    let mut request = StudyRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(FormError::from)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "mode" => {
                let value = field.text().await.map_err(FormError::from)?;
                request.mode = Mode::parse_or_default(value.trim());
            }
            "question" => {
                request.question = field.text().await.map_err(FormError::from)?;
            }
            "pdf" | "image" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(FormError::from)?;
                let upload = Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                };
                if !upload.is_attached() {
                    continue;
                }
                if name == "pdf" {
                    request.pdf = Some(upload);
                } else {
                    request.image = Some(upload);
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

/// Why the form could not be read.
#[derive(Debug, thiserror::Error)]
enum FormError {
    #[error("request body too large")]
    TooLarge,
    #[error("malformed form: {0}")]
    Malformed(String),
}

impl From<axum::extract::multipart::MultipartError> for FormError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FormError::TooLarge
        } else {
            FormError::Malformed(e.body_text())
        }
    }
}

fn form_error_message(e: &FormError, limit: usize) -> String {
    match e {
        FormError::TooLarge => format!(
            "Upload too large. Files must total under {}.",
            human_size(limit)
        ),
        FormError::Malformed(_) => e.to_string(),
    }
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}

// ── Page rendering ────────────────────────────────────────────────────────

/// What the page shows. `answer` is trusted markup; everything else is escaped.
#[derive(Debug, Default)]
struct PageView {
    mode: Mode,
    question: String,
    answer: String,
    error: String,
}

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>FocusStudy AI</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }
textarea { width: 100%; min-height: 6rem; }
.error { color: #a40000; background: #fdecea; padding: .75rem; border-radius: 4px; }
.answer { background: #f4f7fb; padding: 1rem; border-radius: 4px; }
</style>
</head>
<body>
<h1>FocusStudy AI</h1>
<form method="post" enctype="multipart/form-data">
<label>Mode
<select name="mode">{modes}</select>
</label>
<p><textarea name="question" placeholder="Type your question">{question}</textarea></p>
<p><label>Notes (PDF, typed text) <input type="file" name="pdf" accept="application/pdf"></label></p>
<p><label>Notes (photo) <input type="file" name="image" accept="image/*"></label></p>
<p><button type="submit">Ask</button></p>
</form>
{error}
{answer}
</body>
</html>
"#;

fn render_page(view: &PageView) -> String {
    let modes: String = Mode::ALL
        .iter()
        .map(|m| {
            let selected = if *m == view.mode { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, m.as_str(), selected, mode_label(*m))
        })
        .collect();

    let error = if view.error.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="error">{}</p>"#, escape_html(&view.error))
    };

    let answer = if view.answer.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="answer">{}</div>"#, view.answer)
    };

    PAGE_TEMPLATE
        .replace("{modes}", &modes)
        .replace("{error}", &error)
        .replace("{answer}", &answer)
        .replacen("{question}", &escape_html(&view.question), 1)
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Explain => "Explain",
        Mode::Exam => "Exam ready",
        Mode::Revision => "Revision",
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
