use crate::backend::{BackendClient, ToolInfo};
use crate::conversation::{ConversationStore, Message, MessageKind, Sender};
use crate::dispatch::{Dispatcher, FileRequest, Readiness, BACKEND_UNREACHABLE};
use crate::event::AppEvent;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use serde_json::Value;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

/// Expandable detail panels offered per assistant message, keyed by the
/// metadata field that feeds them.
const SECTIONS: [(&str, &str); 4] = [
    ("plan", "Plan"),
    ("executionResults", "Execution results"),
    ("summary", "Summary"),
    ("content", "Extracted content"),
];

pub struct DualMindApp {
    rx: Receiver<AppEvent>,
    client: BackendClient,
    dispatcher: Dispatcher,
    store: ConversationStore,
    input_buffer: String,
    tools: Vec<ToolInfo>,
    startup_error: Option<String>,
}

impl DualMindApp {
    pub fn new(rx: Receiver<AppEvent>, client: BackendClient) -> Self {
        Self {
            rx,
            client,
            dispatcher: Dispatcher::new(),
            store: ConversationStore::new(),
            input_buffer: String::new(),
            tools: Vec::new(),
            startup_error: None,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, ctx),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: &egui::Context) {
        match event {
            AppEvent::HealthChecked(outcome) => {
                match outcome {
                    Ok(()) => {
                        self.dispatcher.complete_health(true);
                        self.client.list_tools();
                    }
                    Err(err) => {
                        self.dispatcher.complete_health(false);
                        self.startup_error = Some(err);
                    }
                }
                ctx.request_repaint();
            }
            AppEvent::ToolsListed(outcome) => match outcome {
                Ok(tools) => self.tools = tools,
                Err(err) => tracing::warn!("leaving tool panel empty: {err}"),
            },
            AppEvent::QueryCompleted(outcome) => {
                self.dispatcher.complete_text(&mut self.store, outcome);
                // The input is cleared exactly once, after the outcome is
                // known; while awaiting it stays visible in the disabled box.
                self.input_buffer.clear();
                ctx.request_repaint();
            }
            AppEvent::PdfParsed { filename, outcome } => {
                self.dispatcher.complete_file(&mut self.store, filename, outcome);
                ctx.request_repaint();
            }
        }
    }

    fn submit_prompt(&mut self) {
        let input = self.input_buffer.clone();
        if let Some(request) = self.dispatcher.begin_text(&mut self.store, &input) {
            self.client.query(request.query, request.context);
        }
    }

    fn pick_and_upload_pdf(&mut self) {
        let selected = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .pick_file()
            .and_then(|path| {
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| "upload.pdf".to_string());
                match std::fs::read(&path) {
                    Ok(bytes) => Some(FileRequest { filename, bytes }),
                    Err(err) => {
                        tracing::warn!("could not read {}: {err}", path.display());
                        None
                    }
                }
            });

        if let Some(request) = self.dispatcher.begin_file(selected) {
            self.client.parse_pdf(request.filename, request.bytes);
        }
    }

    fn status_label(&self) -> (&'static str, Color32) {
        match self.dispatcher.readiness() {
            Readiness::Unknown => ("Connecting...", Color32::YELLOW),
            Readiness::Ready if self.dispatcher.is_loading() => {
                ("Awaiting response...", Color32::YELLOW)
            }
            Readiness::Ready => ("Backend Connected", Color32::LIGHT_GREEN),
            Readiness::Unreachable => ("Backend Unreachable", Color32::RED),
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let (status, color) = self.status_label();
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("DualMind");
                ui.separator();
                ui.label(RichText::new(status).color(color));
            });
        });
    }

    fn render_tools_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tools_panel").resizable(true).show(ctx, |ui| {
            ui.heading("Available Tools");
            ui.separator();
            if self.tools.is_empty() {
                ui.label("No tools reported");
            } else {
                for tool in &self.tools {
                    ui.strong(&tool.name);
                    if !tool.description.is_empty() {
                        ui.label(&tool.description);
                    }
                    ui.separator();
                }
            }
        });
    }

    fn render_startup_screen(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                match self.dispatcher.readiness() {
                    Readiness::Unknown => {
                        ui.spinner();
                        ui.label("Checking backend connectivity...");
                    }
                    _ => {
                        ui.heading(RichText::new(BACKEND_UNREACHABLE).color(Color32::RED));
                        if let Some(cause) = &self.startup_error {
                            ui.label(cause);
                        }
                    }
                }
            });
        });
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        let scroll_to_latest = self.store.take_scroll_request();
        let mut toggled: Vec<String> = Vec::new();
        let mut send_now = false;
        let mut upload_now = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            let transcript_height = (ui.available_height() - 110.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.store.is_empty() {
                        ui.label("Ask a question or upload a PDF to get started.");
                    }

                    for message in self.store.messages() {
                        render_message(ui, &self.store, message, &mut toggled);
                    }

                    if self.dispatcher.is_loading() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Thinking...");
                        });
                    }

                    if scroll_to_latest {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });

            ui.separator();
            let input_enabled = !self.dispatcher.is_loading();
            let hint = if input_enabled {
                "Ask DualMind..."
            } else {
                "Waiting for response..."
            };

            ui.horizontal(|ui| {
                let response = ui.add_enabled(
                    input_enabled,
                    egui::TextEdit::singleline(&mut self.input_buffer)
                        .desired_width(ui.available_width() - 180.0)
                        .hint_text(hint),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    send_now = true;
                }

                let clicked = ui
                    .add_enabled(
                        input_enabled && !self.input_buffer.trim().is_empty(),
                        egui::Button::new("Send"),
                    )
                    .clicked();
                send_now |= clicked;

                upload_now = ui
                    .add_enabled(input_enabled, egui::Button::new("Upload PDF"))
                    .clicked();
            });
        });

        for key in toggled {
            self.store.toggle(&key);
        }
        if send_now {
            self.submit_prompt();
        }
        if upload_now {
            self.pick_and_upload_pdf();
        }
    }
}

fn render_message(
    ui: &mut egui::Ui,
    store: &ConversationStore,
    message: &Message,
    toggled: &mut Vec<String>,
) {
    let label = match message.sender {
        Sender::User => format!("[You] {}", message.content),
        Sender::Assistant => format!("[DualMind] {}", message.content),
    };
    match message.kind {
        Some(MessageKind::Code) => {
            ui.label(RichText::new(label).monospace());
        }
        _ => {
            ui.label(label);
        }
    }

    let Some(metadata) = &message.metadata else {
        return;
    };

    for (field, title) in SECTIONS {
        let Some(value) = metadata.get(field) else {
            continue;
        };

        let key = format!("{}-{field}", message.id);
        let expanded = store.is_expanded(&key);
        let caption = if expanded {
            format!("Hide {}", title.to_lowercase())
        } else {
            format!("Show {}", title.to_lowercase())
        };
        if ui.small_button(caption).clicked() {
            toggled.push(key);
        }
        if expanded {
            render_section_value(ui, value);
        }
    }
}

fn render_section_value(ui: &mut egui::Ui, value: &Value) {
    match value {
        Value::String(text) => {
            ui.label(text);
        }
        other => {
            let pretty = serde_json::to_string_pretty(other)
                .unwrap_or_else(|_| other.to_string());
            ui.label(RichText::new(pretty).monospace());
        }
    }
}

impl eframe::App for DualMindApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        // Completion events arrive on a plain channel, so keep frames coming
        // while a request or the startup probe is outstanding.
        if self.dispatcher.is_loading() || self.dispatcher.readiness() == Readiness::Unknown {
            ctx.request_repaint_after(Duration::from_millis(120));
        }

        self.render_top_bar(ctx);
        match self.dispatcher.readiness() {
            Readiness::Ready => {
                self.render_tools_panel(ctx);
                self.render_chat_panel(ctx);
            }
            _ => self.render_startup_screen(ctx),
        }
    }
}
