//! Application assembly: settings, telemetry, store, modules, HTTP server.

use std::sync::Arc;

use anyhow::Context;

use folio_kernel::{InitCtx, ModuleRegistry, Settings};
use folio_store::Store;

use crate::modules;

/// Build a registry with every project module registered.
pub fn build_registry(store: &Arc<Store>, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, settings);
    registry
}

/// Run the application until a shutdown signal arrives.
pub async fn run() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load FOLIO settings")?;
    folio_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        "folio-app bootstrap starting"
    );

    let store = Arc::new(Store::new());
    let registry = build_registry(&store, &settings);

    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    folio_http::start_server(&registry, &settings).await?;

    registry.stop_all().await?;
    tracing::info!("folio-app shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_carries_both_project_modules() {
        let store = Arc::new(Store::new());
        let settings = Settings::default();
        let registry = build_registry(&store, &settings);

        assert_eq!(registry.module_count(), 2);
        assert!(registry.get_module("books").is_some());
        assert!(registry.get_module("interests").is_some());
    }

    #[tokio::test]
    async fn local_init_seeds_the_demo_catalog() {
        let store = Arc::new(Store::new());
        let settings = Settings::default();
        let registry = build_registry(&store, &settings);

        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };
        registry.init_all(&ctx).await.unwrap();

        assert!(!store.catalog.is_empty());
        let merged = folio_http::router::merged_openapi(&registry);
        assert!(merged["paths"]
            .as_object()
            .unwrap()
            .contains_key("/api/interests/book/{book_id}/aggregate"));
    }
}
