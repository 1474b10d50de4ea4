use crate::backend::{PdfResponse, QueryResponse, ToolInfo};

/// Events sent from background request tasks to the UI thread. Each request
/// issued by the dispatcher produces exactly one completion event; errors
/// are stringified before they cross the channel so the rendering side never
/// sees a transport error type.
#[derive(Debug)]
pub enum AppEvent {
    HealthChecked(Result<(), String>),
    ToolsListed(Result<Vec<ToolInfo>, String>),
    QueryCompleted(Result<QueryResponse, String>),
    PdfParsed {
        filename: String,
        outcome: Result<PdfResponse, String>,
    },
}
