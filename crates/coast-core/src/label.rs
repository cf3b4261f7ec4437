//! # Labels
//!
//! A value in a [`LabeledEnum`](crate::LabeledEnum) may carry a label for
//! display. Labels are either plain text or a [`NameTitle`] pair, where the
//! name is a stable machine identifier (suitable for URLs and forms) and the
//! title is the human-readable text.

use serde::{Deserialize, Serialize};

/// A machine name paired with a display title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameTitle {
    /// Stable machine identifier, e.g. `"pending"`.
    pub name: String,
    /// Display title, e.g. `"Pending"`.
    pub title: String,
}

impl NameTitle {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

/// The label attached to a state value.
///
/// Deserializes from either a bare string or a `{name, title}` map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Plain display text.
    Text(String),
    /// Machine name and display title.
    NameTitle(NameTitle),
}

impl Label {
    /// The display text: the text itself, or the title of a name/title pair.
    pub fn title(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::NameTitle(nt) => &nt.title,
        }
    }

    /// The machine name, if this is a name/title pair.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::NameTitle(nt) => Some(&nt.name),
        }
    }

    pub fn as_name_title(&self) -> Option<&NameTitle> {
        match self {
            Self::Text(_) => None,
            Self::NameTitle(nt) => Some(nt),
        }
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NameTitle> for Label {
    fn from(nt: NameTitle) -> Self {
        Self::NameTitle(nt)
    }
}

impl From<(&str, &str)> for Label {
    fn from((name, title): (&str, &str)) -> Self {
        Self::NameTitle(NameTitle::new(name, title))
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}
