use anyhow::Result;
use uuid::Uuid;

use crate::domain::user::User;
use crate::infra::store::Store;

#[derive(Clone)]
pub struct UserService {
    store: Store,
}

impl UserService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        self.store.find_user(user_id).await
    }
}
