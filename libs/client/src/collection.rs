//! Generic operations over a backend collection. The per-resource modules are
//! thin wrappers over these.

use recipes_proto::v1::{Entity, EntityId, Updatable};

use crate::{ClientError, RecipesClient};

impl RecipesClient {
    /// `GET {COLLECTION}` - the full collection, in backend order.
    pub async fn collection_list<E: Entity>(&self) -> Result<Vec<E>, ClientError> {
        self.perform_get_request(E::COLLECTION).await
    }

    /// `POST {COLLECTION}`. The backend's response body is not used, callers
    /// re-list to observe the new record.
    pub async fn collection_create<E: Entity>(&self, fields: &E::Fields) -> Result<(), ClientError> {
        self.perform_post_request(E::COLLECTION, fields).await
    }

    /// `PUT {COLLECTION}/{id}`
    pub async fn collection_update<E: Updatable>(
        &self,
        id: &EntityId,
        fields: &E::Fields,
    ) -> Result<(), ClientError> {
        self.perform_put_request(&E::item_path(id), fields).await
    }

    /// `DELETE {COLLECTION}/{id}`
    pub async fn collection_delete<E: Entity>(&self, id: &EntityId) -> Result<(), ClientError> {
        self.perform_delete_request(&E::item_path(id)).await
    }
}
