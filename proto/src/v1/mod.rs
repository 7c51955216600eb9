use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::uri;

mod entity;

pub use self::entity::*;

/* ===== collection records ===== */
// The backend owns these. The client only ever holds a disposable copy that
// is replaced wholesale on each list.

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.instructions)
    }
}

impl Entity for Recipe {
    type Fields = RecipeFields;

    const COLLECTION: &'static str = uri::RECIPES;
    const KIND: &'static str = "recipe";
    const LABEL: &'static str = "Recipe";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl Updatable for Recipe {}
impl Searchable for Recipe {}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: EntityId,
    pub name: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Entity for Ingredient {
    type Fields = IngredientFields;

    const COLLECTION: &'static str = uri::INGREDIENTS;
    const KIND: &'static str = "ingredient";
    const LABEL: &'static str = "Ingredient";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

/* ===== request bodies ===== */

/// Body of `POST /recipes` and `PUT /recipes/{id}`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RecipeFields {
    pub name: String,
    pub instructions: String,
}

impl RecipeFields {
    pub fn new(name: &str, instructions: &str) -> Self {
        RecipeFields {
            name: name.to_string(),
            instructions: instructions.to_string(),
        }
    }
}

/// Body of `POST /ingredients`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct IngredientFields {
    pub name: String,
}

impl IngredientFields {
    pub fn new(name: &str) -> Self {
        IngredientFields {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/* ===== errors ===== */

/// The shape of an error body, when the backend bothers to send one.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ErrorMessage {
    #[serde(default)]
    pub message: Option<String>,
}
