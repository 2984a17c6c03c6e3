use std::collections::HashMap;
use std::collections::hash_map;

/// Results of a completed run, keyed by task name.
///
/// Holds exactly the tasks reachable from the terminal task.
#[derive(Debug, Clone)]
pub struct Outputs<V> {
    terminal: String,
    results: HashMap<String, V>,
}

impl<V> Outputs<V> {
    pub(crate) fn new(terminal: String, results: HashMap<String, V>) -> Self {
        Self { terminal, results }
    }

    /// Name of the terminal task the run started from.
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn terminal_output(&self) -> Option<&V> {
        self.results.get(&self.terminal)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.results.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_inner(self) -> HashMap<String, V> {
        self.results
    }
}

impl<V> IntoIterator for Outputs<V> {
    type Item = (String, V);
    type IntoIter = hash_map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[cfg(feature = "serde")]
impl<V: serde::Serialize> serde::Serialize for Outputs<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        // Sorted so the rendering is stable between runs.
        let mut entries: Vec<_> = self.results.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Outputs<u32> {
        let results = [("load".to_string(), 2), ("extract".to_string(), 1)]
            .into_iter()
            .collect();
        Outputs::new("load".into(), results)
    }

    #[test]
    fn test_accessors() {
        let outputs = sample();
        assert_eq!(outputs.terminal(), "load");
        assert_eq!(outputs.terminal_output(), Some(&2));
        assert_eq!(outputs.get("extract"), Some(&1));
        assert_eq!(outputs.get("missing"), None);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.iter().map(|(_, v)| *v).sum::<u32>(), 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_sorted() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"extract":1,"load":2}"#);
    }
}
