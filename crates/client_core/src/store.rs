use async_trait::async_trait;
use shared::{
    domain::{Species, SpeciesFields, SpeciesId, UserId},
    protocol::OwnerScope,
};
use storage::Storage;

use crate::{error::StoreError, SpeciesStore};

fn backend(err: anyhow::Error) -> StoreError {
    StoreError::Backend(format!("{err:#}"))
}

#[async_trait]
impl SpeciesStore for Storage {
    async fn list(&self) -> Result<Vec<Species>, StoreError> {
        self.list_species().await.map_err(backend)
    }

    async fn insert(&self, owner: UserId, fields: &SpeciesFields) -> Result<SpeciesId, StoreError> {
        self.create_species(owner, fields).await.map_err(backend)
    }

    async fn update(&self, scope: OwnerScope, fields: &SpeciesFields) -> Result<(), StoreError> {
        match self.update_species_owned(scope, fields).await.map_err(backend)? {
            0 => Err(StoreError::NoMatch {
                id: scope.id,
                owner: scope.owner,
            }),
            _ => Ok(()),
        }
    }

    async fn delete(&self, scope: OwnerScope) -> Result<(), StoreError> {
        match self.delete_species_owned(scope).await.map_err(backend)? {
            0 => Err(StoreError::NoMatch {
                id: scope.id,
                owner: scope.owner,
            }),
            _ => Ok(()),
        }
    }
}
