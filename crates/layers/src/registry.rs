/// Id-keyed collection that remembers insertion order.
///
/// Re-inserting an id replaces the value in place and hands back the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, value: T) -> Option<T> {
        let id = id.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((id, value));
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.entries.iter().position(|(k, _)| k == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the registry, returning the removed ids in order.
    pub fn clear(&mut self) -> Vec<String> {
        self.entries.drain(..).map(|(k, _)| k).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Registry;

    #[test]
    fn replaces_in_place_and_keeps_order() {
        let mut r = Registry::new();
        assert_eq!(r.insert("b", 1), None);
        assert_eq!(r.insert("a", 2), None);
        assert_eq!(r.insert("b", 3), Some(1));
        assert_eq!(r.ids(), vec!["b", "a"]);
        assert_eq!(r.get("b"), Some(&3));

        if let Some(v) = r.get_mut("a") {
            *v += 10;
        }
        assert_eq!(r.remove("a"), Some(12));
        assert_eq!(r.remove("a"), None);
        assert_eq!(r.clear(), vec!["b".to_string()]);
        assert!(r.is_empty());
    }
}
