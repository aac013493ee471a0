//! Attribute Text
//!
//! CDATA attribute values are a sequence of runs: plain characters, or the
//! replacement text of an sdata entity reference.

use std::sync::Arc;

use crate::Entity;

/// One run of a CDATA value
#[derive(Debug, Clone)]
pub enum TextRun {
    /// Plain characters (possibly empty)
    Chars(Box<[char]>),
    /// Reference to an sdata entity
    Sdata {
        entity: Arc<Entity>,
        text: Box<str>,
    },
}

impl TextRun {
    /// Number of characters in a plain run, zero for sdata
    pub fn char_len(&self) -> usize {
        match self {
            TextRun::Chars(chars) => chars.len(),
            TextRun::Sdata { .. } => 0,
        }
    }

    pub fn is_sdata(&self) -> bool {
        matches!(self, TextRun::Sdata { .. })
    }
}

/// A CDATA value
#[derive(Debug, Clone, Default)]
pub struct Text {
    runs: Vec<TextRun>,
}

impl Text {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append plain characters
    pub fn push_chars(&mut self, s: &str) {
        self.runs.push(TextRun::Chars(s.chars().collect()));
    }

    /// Append an sdata reference
    pub fn push_sdata(&mut self, entity: Arc<Entity>) {
        let text = entity.text().unwrap_or_default().into();
        self.runs.push(TextRun::Sdata { entity, text });
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn run(&self, index: usize) -> Option<&TextRun> {
        self.runs.get(index)
    }

    /// Flattened value with sdata replacement text inlined
    pub fn to_string_lossy(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run {
                TextRun::Chars(chars) => out.extend(chars.iter()),
                TextRun::Sdata { text, .. } => out.push_str(text),
            }
        }
        out
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        let mut text = Text::new();
        text.push_chars(s);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;

    #[test]
    fn test_runs_and_flattening() {
        let mut text = Text::from("a");
        text.push_chars("");
        text.push_sdata(Entity::internal("eacute", EntityKind::Sdata, "[eacute]"));

        assert_eq!(text.runs().len(), 3);
        assert_eq!(text.runs()[1].char_len(), 0);
        assert!(text.runs()[2].is_sdata());
        assert_eq!(text.to_string_lossy(), "a[eacute]");
    }
}
