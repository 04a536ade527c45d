//! Structured dispatch results.

use std::fmt;

/// One decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A rendered scalar field.
    Text(String),
    /// Nested records for tabular decodes (e.g. routing-table rows).
    Records(Vec<Report>),
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<Vec<Report>> for Value {
    fn from(records: Vec<Report>) -> Self {
        Value::Records(records)
    }
}

/// An insertion-ordered list of named field values.
///
/// Produced fresh for every decoded frame and every issued request, handed
/// to the caller's notification sink, and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<(String, Value)>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Report::default()
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Look up a text field by name.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            match value {
                Value::Text(s) => writeln!(f, "{:<20}: {}", name, s)?,
                Value::Records(records) => {
                    writeln!(f, "{}:", name)?;
                    for (i, record) in records.iter().enumerate() {
                        writeln!(f, "  [{}]", i)?;
                        for (n, v) in record.iter() {
                            if let Value::Text(s) = v {
                                writeln!(f, "    {:<18}: {}", n, s)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let mut report = Report::new();
        report.push("Response", "pingDevice response");
        report.push("Status", "ok");

        let names: Vec<_> = report.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Response", "Status"]);
    }

    #[test]
    fn test_get_and_text() {
        let mut report = Report::new();
        report.push("Status", "ok");
        report.push("Rows", Vec::<Report>::new());

        assert_eq!(report.text("Status"), Some("ok"));
        assert_eq!(report.text("Rows"), None);
        assert!(matches!(report.get("Rows"), Some(Value::Records(_))));
        assert!(report.get("missing").is_none());
    }
}
