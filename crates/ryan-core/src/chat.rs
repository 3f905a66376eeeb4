//! Chat projection: backend replies become bubbles, speech and side effects.
//!
//! Nothing here touches the network or the UI. [`Reply`] describes what the host
//! should do; `ryan_client::ChatSession` carries it out.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::creative::CreativeKind;
use crate::protocol::{ChatResponse, ResponseKind};

/// Delay between typed characters for the typing effect.
pub const TYPING_DELAY_MS: u64 = 10;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(https?://|www\.)[-A-Z0-9+&@#/%?=~_|!:,.;]*[-A-Z0-9+&@#/%=~_|]")
        .expect("static regex")
});

static LONE_I_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\W)(i)($|\W)").expect("static regex"));

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("static regex"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ryan,
    Error,
}

impl Sender {
    pub fn class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ryan => "ryan",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleStyle {
    Normal,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleContent {
    /// Inserted as text.
    Plain(String),
    /// Inserted as markup.
    Html(String),
}

impl BubbleContent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(s) | Self::Html(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub sender: Sender,
    pub content: BubbleContent,
    pub style: BubbleStyle,
    /// Reveal character by character before showing the final markup.
    pub typing: bool,
    /// Carries a "View" link to the newest creative output.
    pub creative_link: bool,
}

impl Bubble {
    fn plain(sender: Sender, text: impl Into<String>, style: BubbleStyle) -> Self {
        Self {
            sender,
            content: BubbleContent::Plain(text.into()),
            style,
            typing: false,
            creative_link: false,
        }
    }

    pub fn user(message: &str) -> Self {
        Self::plain(Sender::User, message, BubbleStyle::Normal)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::plain(Sender::Error, text, BubbleStyle::Error)
    }

    /// Class list for a DOM-style host.
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["chat-message", self.sender.class()];
        match self.style {
            BubbleStyle::Error if self.sender != Sender::Error => classes.push("error"),
            BubbleStyle::Info => classes.push("info"),
            _ => {}
        }
        classes
    }

    /// Text as it reads once any markup is stripped.
    pub fn visible_text(&self) -> String {
        match &self.content {
            BubbleContent::Plain(s) => s.clone(),
            BubbleContent::Html(s) => strip_tags(s),
        }
    }
}

/// Everything the host has to do for one backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub bubble: Bubble,
    /// Spoken only while speech is enabled.
    pub speech: Option<String>,
    /// Output to add to the creative store (and select).
    pub creative: Option<(CreativeKind, String)>,
    /// Orb trigger: `Some(is_error)`.
    pub trigger: Option<bool>,
}

impl Reply {
    fn new(bubble: Bubble, speech: Option<String>) -> Self {
        Self {
            bubble,
            speech,
            creative: None,
            trigger: None,
        }
    }

    fn triggering(mut self, is_error: bool) -> Self {
        self.trigger = Some(is_error);
        self
    }
}

/// Turns URLs into links opening in a new target and bolds a standalone `i`.
pub fn render_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        out.push_str(&bold_lone_i(&text[last..m.start()]));
        let href = if SCHEME_RE.is_match(m.as_str()) {
            m.as_str().to_string()
        } else {
            format!("http://{}", m.as_str())
        };
        out.push_str(&format!(r#"<a href="{}" target="_blank">{}</a>"#, href, m.as_str()));
        last = m.end();
    }
    out.push_str(&bold_lone_i(&text[last..]));
    out
}

fn bold_lone_i(segment: &str) -> String {
    LONE_I_RE
        .replace_all(segment, |c: &Captures| {
            format!("{}<strong>{}</strong>{}", &c[1], &c[2], &c[3])
        })
        .into_owned()
}

pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Projects a successful (2xx) chat reply. The orb is triggered exactly once.
pub fn project_response(resp: &ChatResponse) -> Reply {
    let kind = resp.type_name().to_string();
    let Some(content) = resp.content_text() else {
        warn!("Received response with no content for type: {}", kind);
        let bubble = Bubble::plain(
            Sender::Ryan,
            format!("Ryan responded with type '{}', but there was no content.", kind),
            BubbleStyle::Normal,
        );
        let speech = format!("Ryan responded with type {}, but there was no content.", kind);
        return Reply::new(bubble, Some(speech)).triggering(false);
    };

    debug!("Projecting reply of type {}", kind);
    let reply = match resp.response_kind() {
        ResponseKind::Text => {
            let bubble = Bubble {
                sender: Sender::Ryan,
                content: BubbleContent::Html(render_text(&content)),
                style: BubbleStyle::Normal,
                typing: true,
                creative_link: false,
            };
            Reply::new(bubble, Some(content))
        }
        ResponseKind::Error => {
            let bubble = Bubble {
                sender: Sender::Ryan,
                content: BubbleContent::Html(content.clone()),
                style: BubbleStyle::Error,
                typing: false,
                creative_link: false,
            };
            Reply::new(bubble, Some(content))
        }
        ResponseKind::ImageResults => {
            let bubble = Bubble {
                sender: Sender::Ryan,
                content: BubbleContent::Html(content),
                style: BubbleStyle::Normal,
                typing: false,
                creative_link: false,
            };
            let speech = match resp.query.as_deref() {
                Some(q) if !q.is_empty() => format!("I found some images for {}.", q),
                _ => "I found some images.".to_string(),
            };
            Reply::new(bubble, Some(speech))
        }
        ResponseKind::Logs | ResponseKind::Memory => Reply::new(
            Bubble::plain(
                Sender::Ryan,
                format!("[Received {} data, see the dedicated section.]", kind),
                BubbleStyle::Info,
            ),
            None,
        ),
        ResponseKind::Code | ResponseKind::Creative => {
            let creative_kind = match resp.response_kind() {
                ResponseKind::Code => CreativeKind::Code,
                _ => CreativeKind::Creative,
            };
            let mut bubble = Bubble::plain(Sender::Ryan, format!("Generated {}.", kind), BubbleStyle::Normal);
            bubble.creative_link = true;
            let speech = format!(
                "I have generated the {}. You can view it in the creative outputs panel.",
                kind
            );
            let mut reply = Reply::new(bubble, Some(speech));
            reply.creative = Some((creative_kind, content));
            reply
        }
        ResponseKind::Other(_) => {
            warn!("Received unknown response type: {}", kind);
            Reply::new(
                Bubble::plain(
                    Sender::Ryan,
                    format!("Received an unexpected response type: {}", kind),
                    BubbleStyle::Error,
                ),
                Some("I received an unexpected response type.".to_string()),
            )
        }
    };
    reply.triggering(false)
}

/// Non-2xx chat reply. `content` is the body's `content`, if any.
pub fn http_error_reply(content: Option<&str>, status_text: &str) -> Reply {
    let shown = content.unwrap_or(status_text);
    let spoken = format!("Error: {}", content.unwrap_or("An unknown error occurred."));
    Reply::new(Bubble::error(shown), Some(spoken)).triggering(true)
}

/// The request never produced a response.
pub fn transport_error_reply(error: &str) -> Reply {
    Reply::new(
        Bubble::error(format!(
            "An error occurred while communicating with the AI: {}",
            error
        )),
        Some("An error occurred while communicating with the AI.".to_string()),
    )
    .triggering(true)
}

/// Successful `POST /upload_document`. The orb is not triggered by uploads.
pub fn project_upload(file_name: &str, resp: &ChatResponse) -> Reply {
    match (resp.kind.as_deref(), resp.content_text()) {
        (Some("text"), Some(content)) if !content.is_empty() => {
            let mut reply = project_response(resp);
            reply.trigger = None;
            reply
        }
        _ => {
            warn!("Unexpected confirmation for document upload: {:?}", resp);
            Reply::new(
                Bubble::plain(
                    Sender::Ryan,
                    format!(
                        "Document '{}' uploaded, but received unexpected confirmation.",
                        file_name
                    ),
                    BubbleStyle::Normal,
                ),
                Some(format!("Document {} uploaded.", file_name)),
            )
        }
    }
}

pub fn upload_http_error_reply(detail: &str) -> Reply {
    Reply::new(Bubble::error(format!("Error uploading document: {}", detail)), None)
}

pub fn upload_transport_error_reply(error: &str) -> Reply {
    Reply::new(
        Bubble::error(format!(
            "An error occurred while uploading the document: {}",
            error
        )),
        Some("An error occurred while uploading the document.".to_string()),
    )
}
