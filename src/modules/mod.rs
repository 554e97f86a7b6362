pub mod books;
pub mod interests;

use std::sync::Arc;

use folio_kernel::{ModuleRegistry, Settings};
use folio_store::Store;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: &Arc<Store>, settings: &Settings) {
    registry.register(books::create_module(store.clone()));
    registry.register(interests::create_module(store.clone(), settings));
}
