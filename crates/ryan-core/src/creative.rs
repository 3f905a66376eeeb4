//! Creative output store: ordered code/creative artifacts with one active selection.
//!
//! The active index is an `Option<usize>` revalidated by every mutation, so it always
//! points at an existing output or is `None`.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreativeKind {
    Code,
    Creative,
}

impl CreativeKind {
    /// Maps a chat response type; anything but `code`/`creative` is rejected.
    pub fn from_type(tag: &str) -> Option<Self> {
        match tag {
            "code" => Some(Self::Code),
            "creative" => Some(Self::Creative),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Creative => "creative",
        }
    }

    /// Capitalised form used in titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::Code => "Code",
            Self::Creative => "Creative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeOutput {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: CreativeKind,
}

/// `"{Kind} - {h:mm:ss AM/PM}"`, e.g. `Code - 10:30:00 AM`.
pub fn creative_title<Tz: TimeZone>(kind: CreativeKind, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{} - {}", kind.label(), at.format("%-I:%M:%S %p"))
}

fn creative_id<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!(
        "creative-{}-{}",
        at.timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

#[derive(Debug, Clone, Default)]
pub struct CreativeStore {
    outputs: Vec<CreativeOutput>,
    active: Option<usize>,
}

impl CreativeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn outputs(&self) -> &[CreativeOutput] {
        &self.outputs
    }

    pub fn get(&self, index: usize) -> Option<&CreativeOutput> {
        self.outputs.get(index)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&CreativeOutput> {
        self.active.and_then(|i| self.outputs.get(i))
    }

    /// Content sent as `creative_context` with the next chat message.
    pub fn active_content(&self) -> Option<&str> {
        self.active().map(|o| o.content.as_str())
    }

    /// Appends an output stamped with the local time and makes it active.
    pub fn add(&mut self, content: impl Into<String>, kind: CreativeKind) -> usize {
        self.add_at(content, kind, &Local::now())
    }

    pub fn add_at<Tz: TimeZone>(
        &mut self,
        content: impl Into<String>,
        kind: CreativeKind,
        at: &DateTime<Tz>,
    ) -> usize
    where
        Tz::Offset: std::fmt::Display,
    {
        let output = CreativeOutput {
            id: creative_id(at),
            title: creative_title(kind, at),
            content: content.into(),
            kind,
        };
        info!("Adding creative output '{}' ({})", output.title, kind.as_str());
        self.outputs.push(output);
        let index = self.outputs.len() - 1;
        self.active = Some(index);
        index
    }

    /// Removes an output. Out-of-range indices (including any index on an empty store)
    /// change nothing and return `None`.
    pub fn remove(&mut self, index: usize) -> Option<CreativeOutput> {
        if index >= self.outputs.len() {
            debug!("No creative output at index {}", index);
            return None;
        }
        let removed = self.outputs.remove(index);
        self.active = match self.active {
            Some(a) if a == index => self.outputs.len().checked_sub(1),
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        info!("Removed creative output '{}'", removed.title);
        Some(removed)
    }

    /// Removes whatever is active.
    pub fn remove_active(&mut self) -> Option<CreativeOutput> {
        self.active.and_then(|i| self.remove(i))
    }

    /// Selects an output; an out-of-range index clears the selection.
    pub fn select(&mut self, index: usize) -> Option<&CreativeOutput> {
        self.active = (index < self.outputs.len()).then_some(index);
        self.active()
    }

    /// Selects the newest output (the "view" link in chat).
    pub fn select_latest(&mut self) -> Option<&CreativeOutput> {
        self.active = self.outputs.len().checked_sub(1);
        self.active()
    }

    pub fn clear(&mut self) {
        self.outputs.clear();
        self.active = None;
    }

    /// Dropdown model: one option per output, or a single disabled placeholder.
    pub fn dropdown(&self) -> Dropdown {
        if self.outputs.is_empty() {
            return Dropdown {
                options: vec![DropdownOption {
                    index: None,
                    label: "No Creative Outputs".to_string(),
                }],
                selected: None,
                disabled: true,
            };
        }
        Dropdown {
            options: self
                .outputs
                .iter()
                .enumerate()
                .map(|(i, o)| DropdownOption {
                    index: Some(i),
                    label: o.title.clone(),
                })
                .collect(),
            selected: self.active,
            disabled: false,
        }
    }

    /// Display model for the active output.
    pub fn active_view(&self) -> Option<OutputView> {
        self.active().map(OutputView::of)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub index: Option<usize>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown {
    pub options: Vec<DropdownOption>,
    pub selected: Option<usize>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputView {
    Code {
        line_numbers: Vec<usize>,
        language: &'static str,
        content: String,
    },
    Text {
        content: String,
    },
}

impl OutputView {
    pub fn of(output: &CreativeOutput) -> Self {
        match output.kind {
            CreativeKind::Code => Self::Code {
                line_numbers: (1..=output.content.split('\n').count()).collect(),
                language: detect_language(&output.content),
                content: output.content.clone(),
            },
            CreativeKind::Creative => Self::Text {
                content: output.content.clone(),
            },
        }
    }
}

/// Best-effort highlighting hint from content markers.
pub fn detect_language(content: &str) -> &'static str {
    if content.contains("def ") || content.contains("import ") {
        "python"
    } else if content.contains("<html") || content.contains("<body") {
        "html"
    } else if content.contains("function ") || content.contains("console.log") {
        "javascript"
    } else {
        "plaintext"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store_with(n: usize) -> CreativeStore {
        let mut s = CreativeStore::new();
        for i in 0..n {
            s.add(format!("output {}", i), CreativeKind::Creative);
        }
        s
    }

    #[test]
    fn add_selects_newest() {
        let s = store_with(3);
        assert_eq!(s.active_index(), Some(2));
        assert_eq!(s.active_content(), Some("output 2"));
        assert_ne!(s.outputs()[0].id, s.outputs()[1].id);
        assert!(s.outputs()[0].id.starts_with("creative-"));
    }

    #[test]
    fn title_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 22, 30, 5).unwrap();
        assert_eq!(creative_title(CreativeKind::Code, &at), "Code - 10:30:05 PM");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 3, 0).unwrap();
        assert_eq!(creative_title(CreativeKind::Creative, &at), "Creative - 9:03:00 AM");
    }

    #[test]
    fn removing_active_selects_new_last() {
        let mut s = store_with(3);
        s.remove(2).unwrap();
        assert_eq!(s.active_index(), Some(1));
        s.select(0);
        s.remove(0).unwrap();
        assert_eq!(s.active_index(), Some(0));
        s.remove(0).unwrap();
        assert_eq!(s.active_index(), None);
    }

    #[test]
    fn removing_before_active_shifts_down() {
        let mut s = store_with(3);
        s.remove(0).unwrap();
        assert_eq!(s.active_index(), Some(1));
        assert_eq!(s.active_content(), Some("output 2"));
    }

    #[test]
    fn removing_after_active_keeps_it() {
        let mut s = store_with(3);
        s.select(0);
        s.remove(2).unwrap();
        assert_eq!(s.active_index(), Some(0));
    }

    #[test]
    fn out_of_range_is_harmless() {
        let mut s = CreativeStore::new();
        assert!(s.remove(0).is_none());
        assert!(s.remove_active().is_none());
        assert_eq!(s.active_index(), None);

        let mut s = store_with(2);
        assert!(s.remove(5).is_none());
        assert_eq!(s.len(), 2);
        assert!(s.select(9).is_none());
        assert_eq!(s.active_index(), None);
        assert_eq!(s.active_content(), None);
    }

    #[test]
    fn clear_and_dropdown() {
        let mut s = store_with(2);
        let d = s.dropdown();
        assert!(!d.disabled);
        assert_eq!(d.options.len(), 2);
        assert_eq!(d.selected, Some(1));

        s.clear();
        let d = s.dropdown();
        assert!(d.disabled);
        assert_eq!(d.options[0].label, "No Creative Outputs");
        assert_eq!(d.options[0].index, None);
    }

    #[test]
    fn code_view_has_line_numbers_and_language() {
        let mut s = CreativeStore::new();
        s.add("import os\nprint(os.getcwd())\n", CreativeKind::Code);
        match s.active_view().unwrap() {
            OutputView::Code { line_numbers, language, .. } => {
                assert_eq!(line_numbers, vec![1, 2, 3]);
                assert_eq!(language, "python");
            }
            other => panic!("unexpected view {:?}", other),
        }
        assert_eq!(detect_language("<html><body>"), "html");
        assert_eq!(detect_language("console.log(1)"), "javascript");
        assert_eq!(detect_language("fn main() {}"), "plaintext");
    }
}
