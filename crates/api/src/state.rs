//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::services::auth::TokenSigner;
use crate::services::uploads::ImageStore;
use crate::services::{
    AuthService, CatalogService, DashboardService, OrderService, UserAdminService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the stores, the token signer and the upload directory.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Store,
    tokens: TokenSigner,
    images: ImageStore,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Store, tokens: TokenSigner, images: ImageStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                tokens,
                images,
            }),
        }
    }

    /// Build state from configuration over an existing store.
    #[must_use]
    pub fn from_config(config: &ApiConfig, store: Store) -> Self {
        Self::new(
            store,
            TokenSigner::new(&config.jwt_secret),
            ImageStore::new(config.upload_dir.clone()),
        )
    }

    /// Get a reference to the store bundle.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the bearer token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    // Service constructors borrow from the state for one request.

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store().users.as_ref(), self.tokens())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        let store = self.store();
        CatalogService::new(
            store.categories.as_ref(),
            store.products.as_ref(),
            self.images(),
        )
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        let store = self.store();
        OrderService::new(
            store.orders.as_ref(),
            store.users.as_ref(),
            store.products.as_ref(),
        )
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardService<'_> {
        let store = self.store();
        DashboardService::new(
            store.users.as_ref(),
            store.products.as_ref(),
            store.orders.as_ref(),
        )
    }

    #[must_use]
    pub fn user_admin(&self) -> UserAdminService<'_> {
        UserAdminService::new(self.store().users.as_ref())
    }
}
