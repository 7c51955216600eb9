use recipes_proto::v1::{EntityId, Ingredient, IngredientFields};

use crate::{ClientError, RecipesClient};

impl RecipesClient {
    pub async fn ingredient_list(&self) -> Result<Vec<Ingredient>, ClientError> {
        self.collection_list::<Ingredient>().await
    }

    pub async fn ingredient_create(&self, name: &str) -> Result<(), ClientError> {
        self.collection_create::<Ingredient>(&IngredientFields::new(name))
            .await
    }

    pub async fn ingredient_delete(&self, id: &EntityId) -> Result<(), ClientError> {
        self.collection_delete::<Ingredient>(id).await
    }
}
