use anyhow::Context;
use async_trait::async_trait;
use ridebook_core::models::DocumentFile;
use ridebook_drivers::{Confirmation, FeedbackEvent, FeedbackKind, FeedbackReceiver};
use std::io::{BufRead, Write};
use std::path::Path;
use uuid::Uuid;

/// Initialize tracing for the CLI. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ridebook=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Content type from the file extension. Unknown extensions are sent as
/// `application/octet-stream` and rejected by validation.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Read a document from disk the way a file input hands it over.
pub async fn read_document(path: &Path) -> anyhow::Result<DocumentFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    Ok(DocumentFile::new(file_name, guess_content_type(path), bytes))
}

pub fn format_event(event: &FeedbackEvent) -> String {
    match (event.kind, event.error_code) {
        (FeedbackKind::Error, Some(code)) => format!("[error] {} ({})", event.message, code),
        (kind, _) => format!("[{}] {}", kind.as_str(), event.message),
    }
}

/// Print every pending feedback event to stderr.
pub fn drain_feedback(feedback: &mut FeedbackReceiver) {
    while let Ok(event) = feedback.try_recv() {
        eprintln!("{}", format_event(&event));
    }
}

/// Asks on the terminal before deleting.
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm_delete(&self, driver_id: Uuid, label: &str) -> bool {
        let prompt = if label == driver_id.to_string() {
            format!("Delete driver {}? [y/N] ", driver_id)
        } else {
            format!("Delete driver {} ({})? [y/N] ", label, driver_id)
        };

        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{}", prompt);
            std::io::stderr().flush().ok();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read confirmation");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation prompt task failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
