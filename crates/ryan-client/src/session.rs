//! Chat session and the logs/memory sections.
//!
//! Sessions catch every backend error and turn it into a bubble, a log row or a
//! notice. Nothing here returns an error to the UI.

use std::sync::Arc;

use ryan_core::chat::{
    http_error_reply, project_upload, transport_error_reply, upload_http_error_reply,
    upload_transport_error_reply,
};
use ryan_core::logs::LogRow;
use ryan_core::{
    project_response, Bubble, ChatRequest, CreativeStore, LogPager, LogRequest, MemoryBoard,
    MemoryCommand, MemoryView, Reply, UploadRequest,
};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::error::ClientError;
use crate::orb::OrbSignal;
use crate::speech::SpeechOutput;

pub struct ChatSession {
    backend: Arc<dyn Backend>,
    orb: Arc<dyn OrbSignal>,
    speech: Arc<SpeechOutput>,
    creative: CreativeStore,
    transcript: Vec<Bubble>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn Backend>, orb: Arc<dyn OrbSignal>, speech: Arc<SpeechOutput>) -> Self {
        Self {
            backend,
            orb,
            speech,
            creative: CreativeStore::new(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Bubble] {
        &self.transcript
    }

    pub fn creative(&self) -> &CreativeStore {
        &self.creative
    }

    pub fn creative_mut(&mut self) -> &mut CreativeStore {
        &mut self.creative
    }

    pub fn speech(&self) -> &SpeechOutput {
        &self.speech
    }

    /// Sends one user message. Blank input is ignored and returns `None`.
    pub async fn send(&mut self, input: &str) -> Option<Reply> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }
        self.transcript.push(Bubble::user(message));

        let creative_context = self.creative.active_content().map(str::to_string);
        match &creative_context {
            Some(ctx) => debug!(
                "Including creative context in message: {}...",
                ctx.chars().take(100).collect::<String>()
            ),
            None => debug!("No active creative output to include as creative context."),
        }
        let request = ChatRequest {
            message: message.to_string(),
            creative_context,
        };

        let reply = match self.backend.chat(&request).await {
            Ok(response) => {
                info!("Received response of type '{}'", response.type_name());
                project_response(&response)
            }
            Err(ClientError::Http {
                content,
                status_text,
                ..
            }) => http_error_reply(content.as_deref(), &status_text),
            Err(err) => {
                tracing::error!("Error sending message: {}", err);
                transport_error_reply(&err.to_string())
            }
        };
        self.apply(reply.clone());
        Some(reply)
    }

    /// Uploads a text document for the assistant to ingest.
    pub async fn upload_document(&mut self, file_name: &str, file_content: &str) -> Reply {
        info!("Uploading document '{}' to backend...", file_name);
        let request = UploadRequest {
            file_name: file_name.to_string(),
            file_content: file_content.to_string(),
        };
        let reply = match self.backend.upload_document(&request).await {
            Ok(response) => project_upload(file_name, &response),
            Err(err) => match err.http_detail() {
                Some(detail) => upload_http_error_reply(detail),
                None => upload_transport_error_reply(&err.to_string()),
            },
        };
        self.apply(reply.clone());
        reply
    }

    fn apply(&mut self, reply: Reply) {
        if let Some((kind, content)) = reply.creative {
            self.creative.add(content, kind);
        }
        if let Some(is_error) = reply.trigger {
            self.orb.trigger(is_error);
        }
        if let Some(text) = reply.speech.as_deref() {
            self.speech.speak(text);
        }
        self.transcript.push(reply.bubble);
    }
}

/// The logs section: a [`LogPager`] wired to the backend.
pub struct LogsSection {
    backend: Arc<dyn Backend>,
    pager: LogPager,
}

impl LogsSection {
    pub fn new(backend: Arc<dyn Backend>, limit: u64) -> Self {
        Self {
            backend,
            pager: LogPager::new(limit),
        }
    }

    pub fn pager(&self) -> &LogPager {
        &self.pager
    }

    pub fn rows(&self) -> Vec<LogRow> {
        self.pager.rows()
    }

    /// Section shown: reset and load the newest page.
    pub async fn open(&mut self) -> usize {
        let request = self.pager.open();
        self.run(request).await
    }

    pub async fn refresh(&mut self) -> usize {
        let request = self.pager.refresh();
        self.run(request).await
    }

    /// Scroll event; loads one older page when at the top. Returns lines inserted.
    pub async fn scrolled(&mut self, scroll_top: f64) -> usize {
        let request = self.pager.on_scroll(scroll_top);
        self.run(request).await
    }

    async fn run(&mut self, mut request: Option<LogRequest>) -> usize {
        let mut inserted = 0;
        while let Some(req) = request.take() {
            let result = self
                .backend
                .logs(req.limit, req.offset)
                .await
                .map_err(|e| e.to_failure());
            let outcome = self.pager.complete(req, result);
            inserted += outcome.inserted;
            request = outcome.follow_up;
        }
        inserted
    }
}

/// The memory section: a [`MemoryBoard`] wired to the backend.
pub struct MemorySection {
    backend: Arc<dyn Backend>,
    board: MemoryBoard,
}

impl MemorySection {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            board: MemoryBoard::new(),
        }
    }

    pub fn board(&self) -> &MemoryBoard {
        &self.board
    }

    pub fn view(&self) -> &MemoryView {
        self.board.view()
    }

    pub async fn load(&mut self) {
        self.board.begin_load();
        let result = self.backend.memory().await.map_err(|e| e.to_failure());
        self.board.loaded(result);
    }

    /// Starts editing `key`; returns the refusal notice if another edit is open.
    pub fn edit(&mut self, key: &str) -> Option<&'static str> {
        self.board.start_edit(key).err()
    }

    pub fn cancel_edit(&mut self) {
        self.board.cancel_edit();
    }

    /// Saves the open edit and returns the notice to show.
    pub async fn save(&mut self, value: &str) -> String {
        match self.board.save(value) {
            Ok(command) => self.execute(command).await,
            Err(notice) => notice.to_string(),
        }
    }

    /// Deletes `key` (the host asks for confirmation first) and returns the notice.
    pub async fn delete(&mut self, key: &str) -> String {
        let command = self.board.delete(key);
        self.execute(command).await
    }

    async fn execute(&mut self, command: MemoryCommand) -> String {
        let notice = match command {
            MemoryCommand::Update { key, value } => {
                info!("Attempting to update memory key \"{}\"", key);
                let result = self
                    .backend
                    .update_memory(&key, &value)
                    .await
                    .map_err(|e| e.to_failure());
                self.board.update_finished(&key, result)
            }
            MemoryCommand::Delete { key } => {
                info!("Attempting to delete memory key: {}", key);
                let result = self
                    .backend
                    .delete_memory(&key)
                    .await
                    .map_err(|e| e.to_failure());
                self.board.delete_finished(&key, result)
            }
        };
        if notice.refetch {
            self.load().await;
        }
        notice.message
    }
}
