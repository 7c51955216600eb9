use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

// A path segment must not leak into the next segment, the query or the fragment.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The backend's identifier for a record. It is opaque to the client, which
/// only ever formats it back into a path segment.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Number(n)
    }
}

/// A record living in one of the backend's collections.
pub trait Entity:
    fmt::Display + fmt::Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The body sent to create (and where supported, update) a record.
    type Fields: fmt::Debug + Clone + Default + Serialize + Send + Sync;

    /// Path of the collection, relative to the base url.
    const COLLECTION: &'static str;
    /// Lower case noun used when talking to the user about this record.
    const KIND: &'static str;
    /// Capitalised form of [`Entity::KIND`].
    const LABEL: &'static str;

    fn id(&self) -> &EntityId;

    fn name(&self) -> &str;

    /// `{COLLECTION}/{id}`, with the id escaped as a single path segment.
    fn item_path(id: &EntityId) -> String {
        format!(
            "{}/{}",
            Self::COLLECTION,
            utf8_percent_encode(&id.to_string(), SEGMENT_ENCODE_SET)
        )
    }
}

/// The collection accepts `PUT {COLLECTION}/{id}`.
pub trait Updatable: Entity {}

/// The collection may be filtered by name on the client.
pub trait Searchable: Entity {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v1::{Ingredient, Recipe};

    #[test]
    fn test_entity_id_number_or_text() {
        let id: EntityId = serde_json::from_str("42").expect("failed to decode number id");
        assert_eq!(id, EntityId::Number(42));
        assert_eq!(id.to_string(), "42");

        let id: EntityId =
            serde_json::from_str("\"6f1c-ab\"").expect("failed to decode text id");
        assert_eq!(id, EntityId::Text("6f1c-ab".to_string()));
        assert_eq!(id.to_string(), "6f1c-ab");

        assert!(serde_json::from_str::<EntityId>("[1]").is_err());
    }

    #[test]
    fn test_item_path() {
        assert_eq!(Recipe::item_path(&EntityId::Number(7)), "/recipes/7");
        assert_eq!(
            Ingredient::item_path(&EntityId::Text("x".to_string())),
            "/ingredients/x"
        );
    }

    #[test]
    fn test_item_path_escapes_text_id() {
        assert_eq!(
            Recipe::item_path(&EntityId::Text("a/b?c#d".to_string())),
            "/recipes/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            Ingredient::item_path(&EntityId::Text("50% salt".to_string())),
            "/ingredients/50%25%20salt"
        );
        assert_eq!(
            Ingredient::item_path(&EntityId::Text("6f1c-ab".to_string())),
            "/ingredients/6f1c-ab"
        );
    }
}
