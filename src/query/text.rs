//! Free-text matching over the descriptive fields of a port record.

use crate::proto::{Port, Quest};

/// Compiled form of a [`Quest`]: the needle is case-folded once up front.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    needle: String,
    sensitive: bool,
    whole: bool,
}

impl TextMatcher {
    /// Build a matcher for the given quest.
    pub fn new(quest: &Quest) -> Self {
        let needle = if quest.sensitive {
            quest.value.clone()
        } else {
            quest.value.to_lowercase()
        };
        Self {
            needle,
            sensitive: quest.sensitive,
            whole: quest.whole,
        }
    }

    /// Compare a single field against the needle.
    pub fn matches(&self, text: &str) -> bool {
        if self.sensitive {
            self.compare(text)
        } else {
            self.compare(&text.to_lowercase())
        }
    }

    /// A record matches when any of name, city, province or country does.
    pub fn matches_port(&self, port: &Port) -> bool {
        [&port.name, &port.city, &port.province, &port.country]
            .into_iter()
            .any(|field| self.matches(field))
    }

    fn compare(&self, text: &str) -> bool {
        if self.whole {
            text == self.needle
        } else {
            text.contains(self.needle.as_str())
        }
    }
}
