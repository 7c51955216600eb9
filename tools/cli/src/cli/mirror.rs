use std::collections::BTreeMap;

use recipes_proto::v1::{Entity, EntityId};

/// The last collection the backend handed us, in backend order, plus a
/// name index over it. Only ever replaced as a whole.
#[derive(Debug, Clone)]
pub struct LocalMirror<E: Entity> {
    records: Vec<E>,
    by_name: BTreeMap<String, Vec<EntityId>>,
}

impl<E: Entity> Default for LocalMirror<E> {
    fn default() -> Self {
        LocalMirror {
            records: Vec::new(),
            by_name: BTreeMap::new(),
        }
    }
}

impl<E: Entity> LocalMirror<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, records: Vec<E>) {
        let mut by_name: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for record in records.iter() {
            by_name
                .entry(record.name().to_string())
                .or_default()
                .push(record.id().clone());
        }
        self.records = records;
        self.by_name = by_name;
    }

    pub fn records(&self) -> &[E] {
        self.records.as_slice()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every id carrying exactly this name, in backend order. Never empty.
    pub fn lookup(&self, name: &str) -> Option<&[EntityId]> {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .filter(|ids| !ids.is_empty())
    }

    /// Names held by more than one record.
    pub fn duplicate_names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_name
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| (name.as_str(), ids.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipes_proto::v1::Recipe;

    fn recipe(id: i64, name: &str) -> Recipe {
        Recipe {
            id: EntityId::from(id),
            name: name.to_string(),
            instructions: "stir".to_string(),
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut mirror = LocalMirror::new();
        mirror.replace(vec![recipe(1, "Soup"), recipe(2, "Stew")]);
        assert_eq!(mirror.len(), 2);

        mirror.replace(vec![recipe(3, "Salad")]);
        assert_eq!(mirror.records(), &[recipe(3, "Salad")]);
        assert!(mirror.lookup("Soup").is_none());
        assert_eq!(mirror.lookup("Salad"), Some(&[EntityId::from(3)][..]));

        mirror.replace(Vec::new());
        assert!(mirror.is_empty());
        assert!(mirror.lookup("Salad").is_none());
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut mirror = LocalMirror::new();
        mirror.replace(vec![recipe(1, "Soup")]);
        assert!(mirror.lookup("soup").is_none());
        assert!(mirror.lookup("Soup ").is_none());
        assert!(mirror.lookup("Sou").is_none());
    }

    #[test]
    fn test_duplicates_keep_backend_order() {
        let mut mirror = LocalMirror::new();
        mirror.replace(vec![recipe(7, "Soup"), recipe(2, "Stew"), recipe(4, "Soup")]);

        assert_eq!(
            mirror.lookup("Soup"),
            Some(&[EntityId::from(7), EntityId::from(4)][..])
        );
        let dups: Vec<_> = mirror.duplicate_names().collect();
        assert_eq!(dups, vec![("Soup", 2)]);
    }
}
