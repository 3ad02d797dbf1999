//! Product catalog and signed-in user persistence.

use super::persistence::FileRepository;
use crate::domain::{Product, StoreResult, User};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read-only product lookup, loaded once from a JSON catalog.
#[derive(Debug, Default)]
pub struct ProductStore {
    products: Vec<Product>,
}

impl ProductStore {
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Loads the catalog at `path`. A missing catalog yields an empty store.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let products: Vec<Product> = FileRepository::load(path)?.unwrap_or_default();
        info!(path = %path.display(), count = products.len(), "loaded product catalog");
        Ok(Self { products })
    }

    pub fn get_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Resolves `ids` in order, skipping identifiers not in the catalog.
    pub fn get_products<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Product> {
        ids.iter()
            .filter_map(|id| self.get_product(id.as_ref()).cloned())
            .collect()
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }
}

/// Holds the profile of the user signed in on this device.
#[derive(Debug, Default)]
pub struct UserStore {
    path: Option<PathBuf>,
    user: Option<User>,
}

impl UserStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> StoreResult<Self> {
        let user = FileRepository::load(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            user,
        })
    }

    /// Stores `user` as the signed-in user and returns the number of rows
    /// written: 1 on success, 0 if the record has no email to key it by.
    pub fn store_user_info(&mut self, user: &User) -> StoreResult<usize> {
        if user.email.is_empty() {
            return Ok(0);
        }
        if let Some(path) = &self.path {
            FileRepository::save(user, path)?;
        }
        debug!(email = %user.email, "stored user locally");
        self.user = Some(user.clone());
        Ok(1)
    }

    pub fn signed_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn sign_out(&mut self) -> StoreResult<()> {
        self.user = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
