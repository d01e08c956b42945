//! Request-level tests with scripted collaborators.
//!
//! No network and no pdfium: the model and the PDF capability are replaced
//! by in-memory fakes, and the tokio clock is paused so backoff sleeps are
//! instant.

use async_trait::async_trait;
use focus_study::{
    Content, DocumentError, GenerationBackend, GenerationError, Mode, PageTextSource,
    StudyConfig, StudyError, StudyRequest, Tutor, Upload,
};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Replays scripted replies in order and records every call.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<(String, Content)>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Content)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedModel {
    async fn generate(&self, model: &str, content: &Content) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), content.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Provider("script exhausted".into())))
    }
}

/// Returns fixed page texts and counts how often it was asked.
struct FixedPages {
    pages: Result<Vec<String>, ()>,
    calls: AtomicUsize,
}

impl FixedPages {
    fn ok(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: Ok(pages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn broken() -> Arc<Self> {
        Arc::new(Self {
            pages: Err(()),
            calls: AtomicUsize::new(0),
        })
    }
}

impl PageTextSource for FixedPages {
    fn page_texts(&self, _bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .clone()
            .map_err(|_| DocumentError::Open("encrypted".into()))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn tutor(model: Arc<ScriptedModel>, pages: Arc<FixedPages>) -> Tutor {
    let config = StudyConfig::builder()
        .backend(model)
        .page_source(pages)
        .text_model("answer-model")
        .vision_model("vision-model")
        .build()
        .unwrap();
    Tutor::new(config).unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn prompt_of(call: &(String, Content)) -> String {
    match &call.1 {
        Content::Text(t) => t.clone(),
        other => panic!("expected a text prompt, got {other:?}"),
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn blank_question_calls_nothing() {
    let model = ScriptedModel::new(vec![Ok("unused".into())]);
    let pages = FixedPages::ok(&["notes"]);
    let tutor = tutor(model.clone(), pages.clone());

    let request = StudyRequest::new(Mode::Exam, "   \n\t")
        .with_pdf(Upload::new("notes.pdf", b"%PDF".to_vec()))
        .with_image(Upload::new("notes.png", png_bytes()));
    let err = tutor.answer(request).await.unwrap_err();

    assert!(matches!(err, StudyError::Validation));
    assert_eq!(err.to_string(), "Please type your question.");
    assert!(model.calls().is_empty());
    assert_eq!(pages.calls.load(Ordering::SeqCst), 0);
}

// ── Question only ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn question_without_notes() {
    let model = ScriptedModel::new(vec![Ok("Water moves.\n\nAcross membranes.".into())]);
    let tutor = tutor(model.clone(), FixedPages::ok(&[]));

    let answer = tutor
        .answer(StudyRequest::new(Mode::Explain, "  What is osmosis?  "))
        .await
        .unwrap();

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "answer-model");
    let prompt = prompt_of(&calls[0]);
    assert!(prompt.contains("Mode: EXPLAIN"));
    assert!(prompt.contains("NOTES: (none)"));
    assert!(prompt.contains("QUESTION:\nWhat is osmosis?\n"));
    assert!(prompt.ends_with("ANSWER:\n"));

    assert_eq!(answer.markup, "Water moves.<br><br>Across membranes.");
    assert_eq!(answer.text, "Water moves.\n\nAcross membranes.");
    assert_eq!(answer.attempts, 1);
    assert!(!answer.used_notes());
}

#[tokio::test(start_paused = true)]
async fn empty_uploads_are_not_attachments() {
    let model = ScriptedModel::new(vec![Ok("ok".into())]);
    let pages = FixedPages::ok(&[]);
    let tutor = tutor(model.clone(), pages.clone());

    let request = StudyRequest::new(Mode::Revision, "Define entropy")
        .with_pdf(Upload::default())
        .with_image(Upload::default());
    tutor.answer(request).await.unwrap();

    assert_eq!(pages.calls.load(Ordering::SeqCst), 0);
    assert_eq!(model.calls().len(), 1);
    assert!(prompt_of(&model.calls()[0]).contains("Mode: REVISION"));
}

// ── PDF notes ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn scanned_pdf_stops_before_generation() {
    let model = ScriptedModel::new(vec![Ok("unused".into())]);
    let pages = FixedPages::ok(&["", "  \n"]);
    let tutor = tutor(model.clone(), pages.clone());

    let request = StudyRequest::new(Mode::Exam, "Explain osmosis")
        .with_pdf(Upload::new("scan.pdf", b"%PDF-1.7".to_vec()));
    let err = tutor.answer(request).await.unwrap_err();

    assert!(matches!(err, StudyError::UnreadableDocument));
    assert_eq!(
        err.to_string(),
        "This PDF looks scanned/handwritten. Please upload clear images instead."
    );
    assert_eq!(pages.calls.load(Ordering::SeqCst), 1);
    assert!(model.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn broken_pdf_is_reported_as_unreadable() {
    let model = ScriptedModel::new(vec![]);
    let tutor = tutor(model.clone(), FixedPages::broken());

    let request = StudyRequest::new(Mode::Explain, "Explain osmosis")
        .with_pdf(Upload::new("locked.pdf", b"%PDF".to_vec()));
    let err = tutor.answer(request).await.unwrap_err();

    assert!(matches!(err, StudyError::UnreadableDocument));
    assert!(model.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn typed_pdf_grounds_the_prompt() {
    let model = ScriptedModel::new(vec![Ok("Osmosis is...".into())]);
    let pages = FixedPages::ok(&["  Osmosis: water across a membrane.  ", "", "Tonicity."]);
    let tutor = tutor(model.clone(), pages);

    let request = StudyRequest::new(Mode::Exam, "Explain osmosis")
        .with_pdf(Upload::new("biology.pdf", b"%PDF".to_vec()));
    let answer = tutor.answer(request).await.unwrap();

    let prompt = prompt_of(&model.calls()[0]);
    assert!(prompt.contains("Mode: EXAM READY"));
    assert!(prompt.contains("NOTES:\nOsmosis: water across a membrane.\n\nTonicity.\n"));
    assert_eq!(answer.notes_chars, "Osmosis: water across a membrane.\n\nTonicity.".len());
}

// ── Image notes ──────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn image_transcription_becomes_notes() {
    let model = ScriptedModel::new(vec![
        Ok("  Fe + O2 -> Fe2O3\n".into()),
        Ok("4Fe + 3O2 -> 2Fe2O3".into()),
    ]);
    let tutor = tutor(model.clone(), FixedPages::ok(&[]));

    let request = StudyRequest::new(Mode::Explain, "Balance this equation")
        .with_image(Upload::new("page3.jpg", png_bytes()));
    let answer = tutor.answer(request).await.unwrap();

    let calls = model.calls();
    assert_eq!(calls.len(), 2);

    // Transcription: instruction then one PNG image, on the vision model.
    assert_eq!(calls[0].0, "vision-model");
    let images = calls[0].1.images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].mime_type, "image/png");
    assert!(calls[0].1.text().contains("handwritten text"));

    // Answer: transcription verbatim in the notes block.
    assert_eq!(calls[1].0, "answer-model");
    assert!(prompt_of(&calls[1]).contains("NOTES:\nFe + O2 -> Fe2O3\n"));
    assert_eq!(answer.notes_chars, "Fe + O2 -> Fe2O3".len());
    assert_eq!(answer.text, "4Fe + 3O2 -> 2Fe2O3");
}

#[tokio::test(start_paused = true)]
async fn notes_length_counts_characters() {
    let notes = "ΔG = ΔH − TΔS";
    let model = ScriptedModel::new(vec![Ok("Gibbs.".into())]);
    let tutor = tutor(model, FixedPages::ok(&[notes]));

    let request = StudyRequest::new(Mode::Revision, "Gibbs energy?")
        .with_pdf(Upload::new("thermo.pdf", b"%PDF".to_vec()));
    let answer = tutor.answer(request).await.unwrap();

    assert_eq!(answer.notes_chars, 13);
    assert!(notes.len() > 13);
}

#[tokio::test(start_paused = true)]
async fn pdf_and_image_notes_are_joined() {
    let model = ScriptedModel::new(vec![Ok("From the photo.".into()), Ok("done".into())]);
    let tutor = tutor(model.clone(), FixedPages::ok(&["From the PDF."]));

    let request = StudyRequest::new(Mode::Revision, "Summarise")
        .with_pdf(Upload::new("a.pdf", b"%PDF".to_vec()))
        .with_image(Upload::new("b.png", png_bytes()));
    tutor.answer(request).await.unwrap();

    let prompt = prompt_of(&model.calls()[1]);
    assert!(prompt.contains("NOTES:\nFrom the PDF.\n\nFrom the photo.\n"));
}

#[tokio::test(start_paused = true)]
async fn undecodable_image_is_a_transcription_error() {
    let model = ScriptedModel::new(vec![Ok("unused".into())]);
    let tutor = tutor(model.clone(), FixedPages::ok(&[]));

    let request = StudyRequest::new(Mode::Explain, "Read this")
        .with_image(Upload::new("notes.jpg", b"not an image".to_vec()));
    let err = tutor.answer(request).await.unwrap_err();

    assert!(matches!(err, StudyError::Transcription { .. }));
    assert!(err.to_string().starts_with("Image OCR failed: "));
    assert!(model.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_transcription_skips_the_answer() {
    let model = ScriptedModel::new(vec![
        Err(GenerationError::Provider("quota".into())),
        Err(GenerationError::Provider("quota".into())),
        Err(GenerationError::Provider("quota exceeded".into())),
        Ok("unused".into()),
    ]);
    let tutor = tutor(model.clone(), FixedPages::ok(&[]));

    let request = StudyRequest::new(Mode::Explain, "Read this")
        .with_image(Upload::new("notes.png", png_bytes()));
    let err = tutor.answer(request).await.unwrap_err();

    assert_eq!(err.to_string(), "Image OCR failed: quota exceeded");
    let calls = model.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(m, _)| m == "vision-model"));
}

// ── Generation ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn answer_retried_then_succeeds() {
    let model = ScriptedModel::new(vec![
        Err(GenerationError::Provider("503".into())),
        Ok("second time lucky".into()),
    ]);
    let tutor = tutor(model.clone(), FixedPages::ok(&[]));

    let started = tokio::time::Instant::now();
    let answer = tutor
        .answer(StudyRequest::new(Mode::Explain, "Why?"))
        .await
        .unwrap();

    assert_eq!(answer.attempts, 2);
    assert_eq!(answer.text, "second time lucky");
    assert_eq!(started.elapsed(), std::time::Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn exhausted_generation_surfaces_last_error() {
    let model = ScriptedModel::new(vec![
        Err(GenerationError::Provider("first".into())),
        Err(GenerationError::Provider("second".into())),
        Err(GenerationError::Provider("deadline exceeded".into())),
    ]);
    let tutor = tutor(model.clone(), FixedPages::ok(&[]));

    let err = tutor
        .answer(StudyRequest::new(Mode::Exam, "Why?"))
        .await
        .unwrap_err();

    assert!(matches!(err, StudyError::Generation { .. }));
    assert_eq!(err.to_string(), "Generation failed: deadline exceeded");
    assert!(err.is_request_error());
    assert_eq!(model.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn empty_model_reply_is_an_empty_answer() {
    let model = ScriptedModel::new(vec![Ok(String::new())]);
    let tutor = tutor(model, FixedPages::ok(&[]));

    let answer = tutor
        .answer(StudyRequest::new(Mode::Explain, "Anything?"))
        .await
        .unwrap();
    assert_eq!(answer.markup, "");
}

#[tokio::test(start_paused = true)]
async fn custom_preamble_leads_the_prompt() {
    let model = ScriptedModel::new(vec![Ok("ok".into())]);
    let config = StudyConfig::builder()
        .backend(model.clone())
        .page_source(FixedPages::ok(&[]))
        .preamble("You are a terse tutor.\n")
        .build()
        .unwrap();
    let tutor = Tutor::new(config).unwrap();

    tutor
        .answer(StudyRequest::new(Mode::Explain, "Why?"))
        .await
        .unwrap();
    assert!(prompt_of(&model.calls()[0]).starts_with("You are a terse tutor.\nMode: EXPLAIN"));
}
