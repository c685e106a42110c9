use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{IdentityStore, StoreError};
use crate::models::{
    normalize_email, Identity, LinkedProviders, NewIdentity, ProfileUpdate, Provider,
};

/// In-memory IdentityStore for testing and local tooling.
#[derive(Clone, Debug, Default)]
pub struct MemoryIdentityStore {
    identities: Arc<Mutex<HashMap<Uuid, Identity>>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an identity outright. Deletion belongs to user management, not auth.
    pub async fn remove(&self, id: Uuid) -> Option<Identity> {
        self.identities.lock().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.identities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.lock().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .identities
            .lock()
            .await
            .values()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        new.validate().map_err(StoreError::Invalid)?;

        // Check and insert under one lock, like a unique index would.
        let mut identities = self.identities.lock().await;
        if identities.values().any(|i| i.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: new.email,
            display_name: new.display_name,
            first_name: new.first_name,
            last_name: new.last_name,
            avatar_url: new.avatar_url,
            password_hash: new.password_hash,
            linked: LinkedProviders::only(new.provider),
            created_at: now,
            updated_at: now,
        };
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn update_linked_providers(
        &self,
        id: Uuid,
        provider: Provider,
    ) -> Result<(), StoreError> {
        if let Some(identity) = self.identities.lock().await.get_mut(&id) {
            identity.linked.link(provider);
            identity.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        update.validate().map_err(StoreError::Invalid)?;

        let mut identities = self.identities.lock().await;
        let Some(identity) = identities.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(identity);
        identity.updated_at = Utc::now();
        Ok(Some(identity.clone()))
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.identities.lock().await.contains_key(&id))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.lock().await.get(&id).cloned())
    }
}
