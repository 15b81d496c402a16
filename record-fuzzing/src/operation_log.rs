// record-fuzzing/src/operation_log.rs
//! Record of what a fuzzing iteration changed

use std::fmt;

/// One mutation effect: what was done, the value before and the value after
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEntry {
    pub description: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl OperationEntry {
    pub fn new(description: impl Into<String>, before: Option<String>, after: Option<String>) -> Self {
        Self {
            description: description.into(),
            before,
            after,
        }
    }

    /// An event without a value change, e.g. a descent into a nested document
    pub fn event(description: impl Into<String>) -> Self {
        Self::new(description, None, None)
    }
}

impl fmt::Display for OperationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] -> [{}]",
            self.description,
            self.before.as_deref().unwrap_or("null"),
            self.after.as_deref().unwrap_or("null")
        )
    }
}

/// Render an optional value for the log
pub fn describe<T: fmt::Debug>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(|v| format!("{:?}", v))
}

/// Append-only list of [`OperationEntry`] values, cleared between iterations
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: Vec<OperationEntry>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: OperationEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationEntry> {
        self.entries.iter()
    }

    /// One line per entry, in insertion order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_display() {
        let entry = OperationEntry::new("Change id", Some("a".to_string()), None);
        assert_eq!(entry.to_string(), "Change id [a] -> [null]");
        assert_eq!(OperationEntry::event("Descend").to_string(), "Descend [null] -> [null]");
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&Some(3)), Some("3".to_string()));
        assert_eq!(describe::<i32>(&None), None);
    }

    #[test]
    fn test_log_order_and_clear() {
        let mut log = OperationLog::new();
        log.push(OperationEntry::event("first"));
        log.push(OperationEntry::new("second", Some("1".into()), Some("2".into())));
        assert_eq!(log.len(), 2);
        assert_eq!(log.render(), "first [null] -> [null]\nsecond [1] -> [2]");
        log.clear();
        assert!(log.is_empty());
    }
}
