use recipes_proto::v1::{EntityId, Recipe, RecipeFields};

use crate::{ClientError, RecipesClient};

impl RecipesClient {
    pub async fn recipe_list(&self) -> Result<Vec<Recipe>, ClientError> {
        self.collection_list::<Recipe>().await
    }

    pub async fn recipe_create(&self, name: &str, instructions: &str) -> Result<(), ClientError> {
        self.collection_create::<Recipe>(&RecipeFields::new(name, instructions))
            .await
    }

    pub async fn recipe_update(
        &self,
        id: &EntityId,
        name: &str,
        instructions: &str,
    ) -> Result<(), ClientError> {
        self.collection_update::<Recipe>(id, &RecipeFields::new(name, instructions))
            .await
    }

    pub async fn recipe_delete(&self, id: &EntityId) -> Result<(), ClientError> {
        self.collection_delete::<Recipe>(id).await
    }
}
