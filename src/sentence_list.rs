use crate::error::Result;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Default";

/// A titled, ordered collection of practice sentences with its own tallies.
///
/// Two lists are the same list when their sentences are equal; the title and
/// counters do not take part in equality. The sentence content is also the key
/// used to find the persisted row.
#[derive(Debug, Clone)]
pub struct SentenceList {
    pub sentences: Vec<String>,
    pub title: String,
    pub num_completed: u32,
    pub num_correct: u32,
}

impl Default for SentenceList {
    fn default() -> Self {
        Self {
            sentences: Vec::new(),
            title: DEFAULT_TITLE.to_string(),
            num_completed: 0,
            num_correct: 0,
        }
    }
}

impl PartialEq for SentenceList {
    fn eq(&self, other: &Self) -> bool {
        self.sentences == other.sentences
    }
}

impl Eq for SentenceList {}

impl SentenceList {
    pub fn new(sentences: Vec<String>, title: impl Into<String>) -> Self {
        Self {
            sentences,
            title: title.into(),
            num_completed: 0,
            num_correct: 0,
        }
    }

    /// Build a list from file contents, one sentence per line.
    /// Blank lines carry nothing to practise and are dropped.
    pub fn from_lines(contents: &str, title: impl Into<String>) -> Self {
        let sentences = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self::new(sentences, title)
    }

    /// Sentences that can actually be shown (not empty or whitespace-only).
    pub fn practicable(&self) -> Vec<&str> {
        self.sentences
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// JSON array of strings, the form stored in the `sentences` column.
    pub fn sentences_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.sentences)?)
    }

    pub fn parse_sentences(json: &str) -> Result<Vec<String>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Title used for a list imported from `path`: the file's base name.
pub fn title_for_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_title_and_counters() {
        let mut a = SentenceList::new(vec!["one".into(), "two".into()], "a.txt");
        let b = SentenceList::new(vec!["one".into(), "two".into()], "b.txt");
        a.num_correct = 4;
        a.num_completed = 9;
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = SentenceList::new(vec!["one".into(), "two".into()], "x");
        let b = SentenceList::new(vec!["two".into(), "one".into()], "x");
        assert_ne!(a, b);
    }

    #[test]
    fn default_is_an_empty_placeholder() {
        let list = SentenceList::default();
        assert!(list.is_empty());
        assert_eq!(list.title, "Default");
        assert!(list.practicable().is_empty());
    }

    #[test]
    fn from_lines_drops_blank_lines_and_line_endings() {
        let list = SentenceList::from_lines("The cat sat.\r\n\n   \nA dog ran.\n", "pets.txt");
        assert_eq!(list.sentences, vec!["The cat sat.", "A dog ran."]);
        assert_eq!(list.title, "pets.txt");
    }

    #[test]
    fn practicable_skips_whitespace_only_sentences() {
        let list = SentenceList::new(vec!["  ".into(), "real".into(), "".into()], "x");
        assert_eq!(list.practicable(), vec!["real"]);
    }

    #[test]
    fn sentences_json_matches_stored_format() {
        let list = SentenceList::new(vec!["a \"quoted\" one".into(), "b".into()], "x");
        let json = list.sentences_json().unwrap();
        assert_eq!(json, r#"["a \"quoted\" one","b"]"#);
        assert_eq!(SentenceList::parse_sentences(&json).unwrap(), list.sentences);
    }

    #[test]
    fn parse_sentences_rejects_garbage() {
        assert!(SentenceList::parse_sentences("not json").is_err());
    }

    #[test]
    fn title_is_the_file_base_name() {
        assert_eq!(title_for_path(Path::new("/tmp/lists/french.txt")), "french.txt");
    }
}
