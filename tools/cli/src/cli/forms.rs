//! Input handling for each kind of record a page can manage.

use recipes_proto::v1::{Entity, Ingredient, IngredientFields, Recipe, RecipeFields, Updatable};

/// A record that a page can list, add and delete.
pub trait PageEntity: Entity {
    /// Shown when a required field is blank on add.
    const MISSING_ON_ADD: &'static str;
    /// Shown when the name to delete is blank.
    const MISSING_ON_DELETE: &'static str;
    /// Indefinite article for [`Entity::KIND`].
    const ARTICLE: &'static str;

    /// A trimmed copy of the form, or `None` if a required field is blank.
    fn trimmed(fields: &Self::Fields) -> Option<Self::Fields>;

    /// The name field of the form.
    fn form_name(fields: &Self::Fields) -> &str;
}

/// A record whose page also offers update.
pub trait EditablePageEntity: PageEntity + Updatable {
    const MISSING_ON_UPDATE: &'static str;
}

impl PageEntity for Recipe {
    const MISSING_ON_ADD: &'static str = "Please enter both name and instructions";
    const MISSING_ON_DELETE: &'static str = "Please enter a recipe name";
    const ARTICLE: &'static str = "a";

    fn trimmed(fields: &RecipeFields) -> Option<RecipeFields> {
        let name = fields.name.trim();
        let instructions = fields.instructions.trim();
        if name.is_empty() || instructions.is_empty() {
            None
        } else {
            Some(RecipeFields::new(name, instructions))
        }
    }

    fn form_name(fields: &RecipeFields) -> &str {
        fields.name.as_str()
    }
}

impl EditablePageEntity for Recipe {
    const MISSING_ON_UPDATE: &'static str = "Please enter both name and updated instructions";
}

impl PageEntity for Ingredient {
    const MISSING_ON_ADD: &'static str = "Please enter an ingredient name.";
    const MISSING_ON_DELETE: &'static str = "Please enter an ingredient name to delete.";
    const ARTICLE: &'static str = "an";

    fn trimmed(fields: &IngredientFields) -> Option<IngredientFields> {
        let name = fields.name.trim();
        if name.is_empty() {
            None
        } else {
            Some(IngredientFields::new(name))
        }
    }

    fn form_name(fields: &IngredientFields) -> &str {
        fields.name.as_str()
    }
}
