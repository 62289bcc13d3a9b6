//! Ordered favorite lists and entity collection helpers.

use crate::prefs::Preferences;
use serde::{Deserialize, Serialize};

/// Anything addressable by a stable string ID
pub trait Entity {
    fn id(&self) -> &str;
}

/// Append `item` unless an entity with the same ID exists
pub(crate) fn add_unique<T: Entity>(items: &mut Vec<T>, item: T) -> bool {
    if contains_id(items, item.id()) {
        return false;
    }
    items.push(item);
    true
}

/// Remove the entity with `id`, reporting whether one was present
pub(crate) fn remove_by_id<T: Entity>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

pub(crate) fn contains_id<T: Entity>(items: &[T], id: &str) -> bool {
    items.iter().any(|item| item.id() == id)
}

/// Unique IDs in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(Vec<String>);

impl Favorites {
    /// Build from stored IDs, dropping duplicates but keeping first-seen order
    pub fn from_ids(ids: Vec<String>) -> Self {
        let mut favorites = Self::default();
        for id in ids {
            favorites.insert(id);
        }
        favorites
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|f| f == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Append `id` if absent
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Remove `id` if present
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|f| f != id);
        self.0.len() != before
    }

    /// Write the current list under `key`
    pub(crate) fn persist(&self, prefs: &Preferences, key: &str) {
        prefs.save(key, &self.0);
    }
}

impl PartialEq<[&str]> for Favorites {
    fn eq(&self, other: &[&str]) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<const N: usize> PartialEq<[&str; N]> for Favorites {
    fn eq(&self, other: &[&str; N]) -> bool {
        self == &other[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(&'static str);

    impl Entity for Item {
        fn id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_from_ids_dedups() {
        let favorites = Favorites::from_ids(vec![
            "bitcoin".to_string(),
            "ethereum".to_string(),
            "bitcoin".to_string(),
        ]);
        assert_eq!(favorites, ["bitcoin", "ethereum"]);
    }

    #[test]
    fn test_insert_and_remove_keep_order() {
        let mut favorites = Favorites::default();
        assert!(favorites.insert("a"));
        assert!(favorites.insert("b"));
        assert!(!favorites.insert("a"));
        assert!(favorites.insert("c"));
        assert!(favorites.remove("b"));
        assert!(!favorites.remove("b"));

        assert_eq!(favorites, ["a", "c"]);
    }

    #[test]
    fn test_collection_helpers() {
        let mut items = vec![Item("x")];
        assert!(!add_unique(&mut items, Item("x")));
        assert!(add_unique(&mut items, Item("y")));
        assert_eq!(items.len(), 2);

        assert!(remove_by_id(&mut items, "x"));
        assert!(!remove_by_id(&mut items, "x"));
        assert!(contains_id(&items, "y"));
    }
}
