use std::sync::Arc;

use crate::catalog::BookCatalog;
use crate::token::TokenSigner;
use crate::users::UserDirectory;

/// Shared per-process handles. Cloned into every request; nothing here is
/// mutated after startup except through the store's own synchronization.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub books: Arc<dyn BookCatalog>,
    pub tokens: Arc<TokenSigner>,
}

impl AppState {
    /// Uses one store for both capabilities.
    pub fn new<S>(store: S, tokens: TokenSigner) -> Self
    where
        S: UserDirectory + BookCatalog + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            books: store,
            tokens: Arc::new(tokens),
        }
    }
}
