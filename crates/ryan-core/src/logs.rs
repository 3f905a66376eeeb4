//! Log pager: incremental, backward-paginated log viewing.
//!
//! State machine `Idle -> Fetching -> (Idle | Exhausted)`. The pager never performs
//! I/O: it hands out [`LogRequest`]s and is told how they ended via
//! [`LogPager::complete`]. The `fetching` flag is the only guard against overlapping
//! fetches; nothing is queued or retried automatically.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::protocol::{Failure, LogsResponse};

/// Page size, matches the backend default.
pub const DEFAULT_LOG_LIMIT: u64 = 50;

/// Scroll offset (px) from the top that counts as "at the top".
pub const SCROLL_TOP_THRESHOLD: f64 = 10.0;

pub const END_OF_LOGS: &str = "--- End of Logs ---";
pub const LOADING_LOGS: &str = "Loading logs...";
pub const UNEXPECTED_FORMAT: &str = "Received logs data in unexpected format.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Tags a line by its ` - LEVEL - ` delimiter; unknown lines are info.
    pub fn detect(line: &str) -> Self {
        if line.contains(" - DEBUG - ") {
            Self::Debug
        } else if line.contains(" - INFO - ") {
            Self::Info
        } else if line.contains(" - WARNING - ") {
            Self::Warning
        } else if line.contains(" - ERROR - ") {
            Self::Error
        } else if line.contains(" - CRITICAL - ") {
            Self::Critical
        } else {
            Self::Info
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub severity: Severity,
}

impl LogLine {
    pub fn parse(text: &str) -> Self {
        Self {
            text: text.to_string(),
            severity: Severity::detect(text),
        }
    }
}

/// Splits newline-delimited content, dropping blank lines.
pub fn parse_log_content(content: &str) -> Vec<LogLine> {
    content
        .split('\n')
        .filter(|l| !l.trim().is_empty())
        .map(LogLine::parse)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Line(LogLine),
    Error(String),
    EndOfLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    Fetching,
    Exhausted,
}

/// A fetch the host should issue: `GET /logs?limit=&offset=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRequest {
    pub offset: u64,
    pub limit: u64,
    generation: u64,
}

/// Error row text for a failed fetch.
pub fn failure_message(failure: &Failure) -> String {
    failure.describe(
        "Error fetching logs",
        "An error occurred while fetching logs",
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Older entries above existing content.
    Prepend,
    /// First page (or refresh).
    Append,
}

/// Result of [`LogPager::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub placement: Placement,
    /// Log lines inserted by this completion.
    pub inserted: usize,
    /// A reload requested while the finished fetch was in flight.
    pub follow_up: Option<LogRequest>,
}

/// Projected row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub text: String,
    pub classes: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct LogPager {
    limit: u64,
    offset: u64,
    exhausted: bool,
    fetching: bool,
    in_flight: Option<u64>,
    entries: VecDeque<LogEntry>,
    generation: u64,
    reload_pending: bool,
}

impl LogPager {
    pub fn new(limit: u64) -> Self {
        Self {
            limit: limit.max(1),
            offset: 0,
            exhausted: false,
            fetching: false,
            in_flight: None,
            entries: VecDeque::new(),
            generation: 0,
            reload_pending: false,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn state(&self) -> PagerState {
        if self.fetching {
            PagerState::Fetching
        } else if self.exhausted {
            PagerState::Exhausted
        } else {
            PagerState::Idle
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Section opened: reset and request the newest page.
    pub fn open(&mut self) -> Option<LogRequest> {
        self.reset();
        self.begin_fetch()
    }

    /// Explicit refresh behaves exactly like reopening the section.
    pub fn refresh(&mut self) -> Option<LogRequest> {
        self.open()
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.exhausted = false;
        self.entries.clear();
        self.generation += 1;
        if self.fetching {
            // The in-flight page belongs to the old view; reload once it lands.
            self.reload_pending = true;
        }
    }

    /// Starts a fetch at the current offset when the guard allows it.
    pub fn begin_fetch(&mut self) -> Option<LogRequest> {
        if self.fetching {
            debug!("Already fetching logs, skipping.");
            return None;
        }
        if self.exhausted && self.offset > 0 {
            debug!("All logs already loaded.");
            return None;
        }
        self.fetching = true;
        self.in_flight = Some(self.offset);
        info!("Fetching logs with offset={}, limit={}", self.offset, self.limit);
        Some(LogRequest {
            offset: self.offset,
            limit: self.limit,
            generation: self.generation,
        })
    }

    /// Scroll event on the log box. Near the top, loads the next older page.
    pub fn on_scroll(&mut self, scroll_top: f64) -> Option<LogRequest> {
        let at_top = scroll_top <= SCROLL_TOP_THRESHOLD;
        if !at_top || self.fetching || self.exhausted {
            return None;
        }
        self.begin_fetch()
    }

    /// Applies the outcome of a fetch previously handed out by this pager.
    pub fn complete(
        &mut self,
        request: LogRequest,
        result: Result<LogsResponse, Failure>,
    ) -> PageOutcome {
        self.fetching = false;
        self.in_flight = None;

        let placement = if request.offset > 0 {
            Placement::Prepend
        } else {
            Placement::Append
        };

        if request.generation != self.generation {
            debug!("Dropping stale log page at offset {}", request.offset);
            let follow_up = if std::mem::take(&mut self.reload_pending) {
                self.begin_fetch()
            } else {
                None
            };
            return PageOutcome {
                placement,
                inserted: 0,
                follow_up,
            };
        }

        let inserted = match result {
            Err(err) => {
                warn!("Log fetch failed: {:?}", err);
                self.entries.push_back(LogEntry::Error(failure_message(&err)));
                0
            }
            Ok(resp) => self.apply_page(request, placement, resp),
        };

        if self.exhausted && !self.entries.iter().any(|e| *e == LogEntry::EndOfLogs) {
            self.entries.push_front(LogEntry::EndOfLogs);
        }

        info!(
            "Finished fetching logs. Next offset: {}, All logs loaded: {}",
            self.offset, self.exhausted
        );
        PageOutcome {
            placement,
            inserted,
            follow_up: None,
        }
    }

    fn apply_page(&mut self, request: LogRequest, placement: Placement, resp: LogsResponse) -> usize {
        let content = resp.content.as_ref();
        match (resp.kind.as_deref(), content) {
            (Some("logs"), Some(serde_json::Value::String(text))) => {
                let lines = parse_log_content(text);
                let count = lines.len();
                match placement {
                    Placement::Prepend => {
                        for line in lines.into_iter().rev() {
                            self.entries.push_front(LogEntry::Line(line));
                        }
                    }
                    Placement::Append => {
                        self.entries.extend(lines.into_iter().map(LogEntry::Line));
                    }
                }
                self.offset = next_offset(request.offset, count, resp.next_offset);
                // Without `has_more`, only an empty page ends the history.
                self.exhausted = match resp.has_more {
                    Some(more) => !more,
                    None => count == 0,
                };
                count
            }
            (Some("error"), Some(detail)) if !detail.is_null() => {
                let detail = match detail {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.entries.push_back(LogEntry::Error(format!("Error: {}", detail)));
                0
            }
            _ => {
                self.entries
                    .push_back(LogEntry::Error(UNEXPECTED_FORMAT.to_string()));
                0
            }
        }
    }

    /// Projects the pager into display rows, top to bottom.
    pub fn rows(&self) -> Vec<LogRow> {
        let mut rows: Vec<LogRow> = self
            .entries
            .iter()
            .map(|e| match e {
                LogEntry::Line(line) => LogRow {
                    text: line.text.clone(),
                    classes: vec!["log-message", line.severity.class()],
                },
                LogEntry::Error(msg) => LogRow {
                    text: msg.clone(),
                    classes: vec!["log-message", "error"],
                },
                LogEntry::EndOfLogs => LogRow {
                    text: END_OF_LOGS.to_string(),
                    classes: vec!["log-message", "end-of-logs"],
                },
            })
            .collect();

        if let Some(offset) = self.in_flight {
            let loading = LogRow {
                text: LOADING_LOGS.to_string(),
                classes: vec!["loading-indicator"],
            };
            if offset > 0 {
                rows.insert(0, loading);
            } else {
                rows.push(loading);
            }
        }
        rows
    }
}

impl Default for LogPager {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LIMIT)
    }
}

/// Server-provided offset, or `offset + lines` when absent (a zero counts as absent).
pub fn next_offset(offset: u64, lines: usize, server: Option<u64>) -> u64 {
    match server {
        Some(n) if n > 0 => n,
        _ => offset + lines as u64,
    }
}

/// Scroll position to apply after an insertion so the viewport does not jump:
/// prepends keep the previously visible content in place, appends stick to the bottom.
pub fn scroll_after_insert(placement: Placement, old_height: f64, new_height: f64) -> f64 {
    match placement {
        Placement::Prepend => (new_height - old_height).max(0.0),
        Placement::Append => new_height,
    }
}
