//! Prompt assembly for the summarizer collaborator. The engine hands the
//! collaborator plain text; content blobs are truncated against a char
//! budget so a huge session still produces a bounded prompt.

use saga_core::summarize::{SessionSummary, SummarizeError, Summarizer};
use saga_core::{Change, ChangeKind, Session};

const TRUNCATION_MARKER: &str = "\n[truncated]";
const MIN_BLOB_CHARS: usize = 200;

// ── Prompt transport ──

/// A collaborator that consumes plain prompt text and returns the typed
/// summary. Closures `Fn(&str) -> Result<SessionSummary, SummarizeError>`
/// implement it directly.
pub trait PromptTransport {
    fn send(&self, prompt: &str) -> Result<SessionSummary, SummarizeError>;
}

impl<F> PromptTransport for F
where
    F: Fn(&str) -> Result<SessionSummary, SummarizeError>,
{
    fn send(&self, prompt: &str) -> Result<SessionSummary, SummarizeError> {
        self(prompt)
    }
}

/// `Summarizer` over a plain-text transport: renders the change set into
/// prompt text under the configured char budget before handing it off.
pub struct PromptSummarizer<T> {
    transport: T,
    budget_chars: usize,
}

impl<T: PromptTransport> PromptSummarizer<T> {
    pub fn new(transport: T, budget_chars: usize) -> Self {
        PromptSummarizer {
            transport,
            budget_chars,
        }
    }
}

impl<T: PromptTransport> Summarizer for PromptSummarizer<T> {
    fn summarize(
        &self,
        session: &Session,
        changes: &[Change],
    ) -> Result<SessionSummary, SummarizeError> {
        let prompt = build_prompt(session, changes, self.budget_chars);
        self.transport.send(&prompt)
    }
}

/// Total payload chars across a change set: every content blob a change
/// carries, matched exhaustively per kind.
pub fn estimate_chars(changes: &[Change]) -> usize {
    changes
        .iter()
        .map(|c| match &c.kind {
            ChangeKind::Save {
                old_content,
                new_content,
            } => old_content.len() + new_content.len(),
            ChangeKind::Create { content } => content.len(),
            ChangeKind::Delete { last_content } => last_content.len(),
            ChangeKind::Rename { new_file_path } => new_file_path.len(),
        })
        .sum()
}

/// Render the prompt text for one session's change set. When the payload
/// estimate exceeds `budget_chars`, each blob is cut to a per-blob
/// allowance (head kept, marker appended).
pub fn build_prompt(session: &Session, changes: &[Change], budget_chars: usize) -> String {
    let blob_limit = blob_limit(changes, budget_chars);

    let mut out = String::new();
    out.push_str(
        "Summarize this editing session for a development journal.\n\
         For every file, produce one short line per change in the form\n\
         `HH:MM:SS <description>`, using each change's timestamp.\n\n",
    );
    out.push_str(&format!(
        "Session {} ({} changes)\n\n",
        session.label(),
        changes.len()
    ));

    for change in changes {
        let clock = saga_core::change_clock(change.timestamp);
        match &change.kind {
            ChangeKind::Save {
                old_content,
                new_content,
            } => {
                out.push_str(&format!("## {} saved at {clock}\n", change.file_path));
                out.push_str("### Before\n");
                out.push_str(&clip(old_content, blob_limit));
                out.push_str("\n### After\n");
                out.push_str(&clip(new_content, blob_limit));
                out.push('\n');
            }
            ChangeKind::Create { content } => {
                out.push_str(&format!("## {} created at {clock}\n", change.file_path));
                out.push_str(&clip(content, blob_limit));
                out.push('\n');
            }
            ChangeKind::Delete { last_content } => {
                out.push_str(&format!("## {} deleted at {clock}\n", change.file_path));
                out.push_str("### Last content\n");
                out.push_str(&clip(last_content, blob_limit));
                out.push('\n');
            }
            ChangeKind::Rename { new_file_path } => {
                out.push_str(&format!(
                    "## {} renamed to {new_file_path} at {clock}\n",
                    change.file_path
                ));
            }
        }
        out.push('\n');
    }
    out
}

/// Per-blob allowance: unlimited while the estimate fits the budget,
/// otherwise an even split with a floor so tiny blobs stay whole.
fn blob_limit(changes: &[Change], budget_chars: usize) -> usize {
    let estimate = estimate_chars(changes);
    if estimate <= budget_chars {
        return usize::MAX;
    }
    // Saves carry two blobs; everything else one.
    let blobs: usize = changes
        .iter()
        .map(|c| match c.kind {
            ChangeKind::Save { .. } => 2,
            _ => 1,
        })
        .sum();
    (budget_chars / blobs.max(1)).max(MIN_BLOB_CHARS)
}

/// Keep the head of `text`, cutting on a char boundary and appending the
/// truncation marker.
fn clip(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut cut = limit;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &text[..cut])
}
