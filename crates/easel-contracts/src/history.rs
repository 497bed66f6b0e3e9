use std::path::PathBuf;

use chrono::{DateTime, Utc};

pub const HISTORY_CAPACITY: usize = 10;

/// Raw image payload as returned by a provider. Owned exclusively by the
/// record that carries it; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub record_id: String,
    pub image: ImageArtifact,
    pub image_path: Option<PathBuf>,
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub style: String,
    pub realism_mode: bool,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
}

/// Per-session generation history, most-recent-first.
///
/// Insertion is always at the front; whenever the length would exceed
/// [`HISTORY_CAPACITY`] the oldest entries are dropped from the back. Lives
/// for one session only and is never persisted.
#[derive(Debug, Default)]
pub struct History {
    records: Vec<GenerationRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: GenerationRecord) {
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn list(&self) -> &[GenerationRecord] {
        self.records.as_slice()
    }

    pub fn get(&self, index: usize) -> Option<&GenerationRecord> {
        self.records.get(index)
    }

    pub fn latest(&self) -> Option<&GenerationRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{GenerationRecord, History, ImageArtifact, HISTORY_CAPACITY};

    fn record(prompt: &str) -> GenerationRecord {
        GenerationRecord {
            record_id: format!("id-{prompt}"),
            image: ImageArtifact {
                bytes: vec![0u8; 4],
                mime_type: Some("image/png".to_string()),
            },
            image_path: None,
            original_prompt: prompt.to_string(),
            enhanced_prompt: format!("{prompt}, enhanced"),
            style: "none".to_string(),
            realism_mode: false,
            width: 512,
            height: 512,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn push_inserts_most_recent_first() {
        let mut history = History::new();
        history.push(record("first"));
        history.push(record("second"));

        let prompts: Vec<&str> = history
            .list()
            .iter()
            .map(|row| row.original_prompt.as_str())
            .collect();
        assert_eq!(prompts, vec!["second", "first"]);
        assert_eq!(history.latest().map(|row| row.original_prompt.as_str()), Some("second"));
    }

    #[test]
    fn push_beyond_capacity_drops_oldest() {
        let mut history = History::new();
        for idx in 0..11 {
            history.push(record(&format!("prompt-{idx:02}")));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let prompts: Vec<&str> = history
            .list()
            .iter()
            .map(|row| row.original_prompt.as_str())
            .collect();
        // prompt-00 fell off the back; the ten most recent remain, newest first.
        assert_eq!(prompts.first().copied(), Some("prompt-10"));
        assert_eq!(prompts.last().copied(), Some("prompt-01"));
        assert!(!prompts.contains(&"prompt-00"));
    }

    #[test]
    fn clear_empties_history() {
        let mut history = History::new();
        history.push(record("one"));
        history.push(record("two"));
        history.clear();

        assert!(history.is_empty());
        assert!(history.list().is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn get_indexes_from_most_recent() {
        let mut history = History::new();
        history.push(record("older"));
        history.push(record("newer"));

        assert_eq!(
            history.get(0).map(|row| row.original_prompt.as_str()),
            Some("newer")
        );
        assert_eq!(
            history.get(1).map(|row| row.original_prompt.as_str()),
            Some("older")
        );
        assert!(history.get(2).is_none());
    }
}
