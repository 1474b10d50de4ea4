use crate::backend::{PdfResponse, QueryResponse};
use crate::conversation::{ConversationStore, Message, MessageKind};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const FALLBACK_ANSWER: &str = "I processed your request, but no answer was produced.";
pub const QUERY_FAILURE: &str =
    "Sorry, something went wrong while processing your request. Please try again.";
pub const PDF_FAILURE: &str = "Sorry, I couldn't read that PDF. Please try again.";
pub const BACKEND_UNREACHABLE: &str =
    "Cannot reach the DualMind backend. Start the API server and relaunch the app.";

/// One-time startup connectivity gate: the chat view mounts only once the
/// health probe has reported `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Unknown,
    Ready,
    Unreachable,
}

/// An accepted text intent, ready to be issued against `POST /api/query`.
#[derive(Debug)]
pub struct TextRequest {
    pub query: String,
    pub context: Map<String, Value>,
}

/// A selected file, ready to be issued against `POST /api/parse-pdf`.
#[derive(Debug)]
pub struct FileRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Sequences one logical request at a time and translates backend outcomes
/// into Messages. Split into `begin_*` / `complete_*` halves: `begin_*` runs
/// the guards and the synchronous store mutations before any network call,
/// `complete_*` reconciles the single completion event back into the store.
/// Every accepted intent yields exactly one follow-up assistant Message:
/// both halves run on the UI thread and at most one request is awaiting at
/// a time.
pub struct Dispatcher {
    readiness: Readiness,
    loading: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            readiness: Readiness::Unknown,
            loading: false,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn complete_health(&mut self, ok: bool) {
        self.readiness = if ok {
            Readiness::Ready
        } else {
            Readiness::Unreachable
        };
    }

    /// Accepts a text intent: rejects empty-after-trim input and re-entrant
    /// calls while a prior request is awaiting (ignored, not queued). On
    /// acceptance the user Message is appended before this returns, so the
    /// transcript always shows the prompt before its response arrives.
    pub fn begin_text(&mut self, store: &mut ConversationStore, input: &str) -> Option<TextRequest> {
        let query = input.trim();
        if query.is_empty() || self.loading {
            return None;
        }

        store.append(Message::user(query.to_string()));
        self.loading = true;
        Some(TextRequest {
            query: query.to_string(),
            context: Map::new(),
        })
    }

    /// Appends the assistant half of a text exchange. Success carries the
    /// backend's plan / execution results / summary through verbatim for the
    /// rendering layer; failure appends the fixed apology with no metadata.
    pub fn complete_text(
        &mut self,
        store: &mut ConversationStore,
        outcome: Result<QueryResponse, String>,
    ) {
        let message = match outcome {
            Ok(response) => {
                let content = response
                    .final_answer
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                let mut metadata = HashMap::new();
                if let Some(plan) = response.plan {
                    metadata.insert("plan".to_string(), plan);
                }
                if let Some(results) = response.execution_results {
                    metadata.insert("executionResults".to_string(), results);
                }
                if let Some(summary) = response.summary {
                    metadata.insert("summary".to_string(), Value::String(summary));
                }
                Message::assistant(content).with_metadata(metadata)
            }
            Err(_) => Message::assistant(QUERY_FAILURE.to_string()),
        };

        store.append(message);
        self.loading = false;
    }

    /// Accepts a file intent. `None` means no file was selected; both that
    /// and the loading guard are silent no-ops. Unlike text, no user Message
    /// is appended; the upload only enters the transcript once the backend
    /// has produced a result or failure.
    pub fn begin_file(&mut self, file: Option<FileRequest>) -> Option<FileRequest> {
        let file = file?;
        if self.loading {
            return None;
        }
        self.loading = true;
        Some(file)
    }

    pub fn complete_file(
        &mut self,
        store: &mut ConversationStore,
        filename: String,
        outcome: Result<PdfResponse, String>,
    ) {
        let message = match outcome {
            Ok(parsed) => {
                let mut metadata = HashMap::new();
                metadata.insert("filename".to_string(), Value::String(filename.clone()));
                metadata.insert("content".to_string(), parsed.content);
                Message::assistant(format!(
                    "Uploaded PDF: {filename}. Ask me anything about its contents."
                ))
                .with_kind(MessageKind::Pdf)
                .with_metadata(metadata)
            }
            Err(_) => Message::assistant(PDF_FAILURE.to_string()),
        };

        store.append(message);
        self.loading = false;
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;

    fn query_response(raw: &str) -> QueryResponse {
        serde_json::from_str(raw).expect("test response should parse")
    }

    #[test]
    fn accepted_send_text_appends_exactly_one_user_and_one_assistant_message() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        let request = dispatcher
            .begin_text(&mut store, "hello")
            .expect("non-empty input should be accepted");
        assert_eq!(request.query, "hello");
        assert!(request.context.is_empty());
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].sender, Sender::User);
        assert_eq!(store.messages()[0].content, "hello");

        dispatcher.complete_text(&mut store, Ok(query_response(r#"{"final_answer": "hi there"}"#)));
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[1].sender, Sender::Assistant);
        assert!(!dispatcher.is_loading());
    }

    #[test]
    fn empty_and_whitespace_input_is_silently_ignored() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        assert!(dispatcher.begin_text(&mut store, "").is_none());
        assert!(dispatcher.begin_text(&mut store, "   \t\n").is_none());
        assert!(store.is_empty());
        assert!(!dispatcher.is_loading());
    }

    #[test]
    fn input_is_trimmed_before_dispatch() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        let request = dispatcher
            .begin_text(&mut store, "  hello  ")
            .expect("padded input should be accepted");
        assert_eq!(request.query, "hello");
        assert_eq!(store.messages()[0].content, "hello");
    }

    #[test]
    fn loading_guard_ignores_reentrant_send_text() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher
            .begin_text(&mut store, "first")
            .expect("first send should be accepted");
        assert!(dispatcher.begin_text(&mut store, "second").is_none());
        assert_eq!(store.messages().len(), 1, "no second user message while awaiting");

        dispatcher.complete_text(&mut store, Ok(query_response("{}")));
        assert!(
            dispatcher.begin_text(&mut store, "third").is_some(),
            "next intent is permitted once the outcome is known"
        );
    }

    #[test]
    fn final_answer_becomes_assistant_content_verbatim() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.begin_text(&mut store, "hello");
        dispatcher.complete_text(&mut store, Ok(query_response(r#"{"final_answer": "hi there"}"#)));

        assert_eq!(store.messages()[1].content, "hi there");
    }

    #[test]
    fn missing_final_answer_falls_back_to_fixed_acknowledgement() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.begin_text(&mut store, "x");
        dispatcher.complete_text(&mut store, Ok(query_response("{}")));

        assert_eq!(store.messages()[1].content, FALLBACK_ANSWER);
        assert!(store.messages()[1].metadata.is_none());
    }

    #[test]
    fn plan_results_and_summary_are_carried_through_as_metadata() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.begin_text(&mut store, "analyze");
        dispatcher.complete_text(
            &mut store,
            Ok(query_response(
                r#"{
                    "final_answer": "done",
                    "plan": {"steps": ["lookup", "synthesize"]},
                    "execution_results": [{"tool": "qa_engine"}],
                    "summary": "looked things up"
                }"#,
            )),
        );

        let metadata = store.messages()[1]
            .metadata
            .as_ref()
            .expect("structured response should carry metadata");
        assert!(metadata.contains_key("plan"));
        assert!(metadata.contains_key("executionResults"));
        assert_eq!(
            metadata.get("summary"),
            Some(&Value::String("looked things up".to_string()))
        );
    }

    #[test]
    fn query_failure_appends_fixed_error_with_no_metadata() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.begin_text(&mut store, "hello");
        dispatcher.complete_text(&mut store, Err("connection refused".to_string()));

        assert_eq!(store.messages().len(), 2);
        let reply = &store.messages()[1];
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.content, QUERY_FAILURE);
        assert!(reply.metadata.is_none());
        assert!(!dispatcher.is_loading(), "loading clears on the failure branch");
    }

    #[test]
    fn pdf_upload_success_appends_one_pdf_message_and_no_user_message() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        let accepted = dispatcher.begin_file(Some(FileRequest {
            filename: "report.pdf".to_string(),
            bytes: vec![0x25, 0x50, 0x44, 0x46],
        }));
        assert!(accepted.is_some());
        assert!(store.is_empty(), "uploads append no user message");
        assert!(dispatcher.is_loading());

        dispatcher.complete_file(
            &mut store,
            "report.pdf".to_string(),
            Ok(PdfResponse {
                content: Value::String("Page 1 text".to_string()),
            }),
        );

        assert_eq!(store.messages().len(), 1);
        let message = &store.messages()[0];
        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.kind, Some(MessageKind::Pdf));
        let metadata = message.metadata.as_ref().expect("pdf message carries metadata");
        assert_eq!(
            metadata.get("filename"),
            Some(&Value::String("report.pdf".to_string()))
        );
        assert_eq!(
            metadata.get("content"),
            Some(&Value::String("Page 1 text".to_string()))
        );
        assert!(!dispatcher.is_loading());
    }

    #[test]
    fn pdf_upload_failure_appends_fixed_error() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.begin_file(Some(FileRequest {
            filename: "report.pdf".to_string(),
            bytes: Vec::new(),
        }));
        dispatcher.complete_file(&mut store, "report.pdf".to_string(), Err("500".to_string()));

        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].content, PDF_FAILURE);
        assert!(store.messages()[0].metadata.is_none());
        assert!(!dispatcher.is_loading());
    }

    #[test]
    fn no_file_selected_is_a_silent_noop() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        assert!(dispatcher.begin_file(None).is_none());
        assert!(store.is_empty());
        assert!(!dispatcher.is_loading());
    }

    #[test]
    fn file_intent_while_awaiting_is_ignored() {
        let mut dispatcher = Dispatcher::new();
        let mut store = ConversationStore::new();

        dispatcher.begin_text(&mut store, "hello");
        let rejected = dispatcher.begin_file(Some(FileRequest {
            filename: "report.pdf".to_string(),
            bytes: Vec::new(),
        }));
        assert!(rejected.is_none());
    }

    #[test]
    fn health_probe_sets_readiness_once() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.readiness(), Readiness::Unknown);

        dispatcher.complete_health(true);
        assert_eq!(dispatcher.readiness(), Readiness::Ready);

        let mut unreachable = Dispatcher::new();
        unreachable.complete_health(false);
        assert_eq!(unreachable.readiness(), Readiness::Unreachable);
    }

    #[test]
    fn message_count_is_twice_the_accepted_send_count() {
        let mut store = ConversationStore::new();
        let mut dispatcher = Dispatcher::new();

        let inputs = ["one", "", "two", "   ", "three"];
        let mut accepted = 0;
        for input in inputs {
            if dispatcher.begin_text(&mut store, input).is_some() {
                accepted += 1;
                dispatcher.complete_text(&mut store, Ok(query_response("{}")));
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(store.messages().len(), 2 * accepted);
    }
}
