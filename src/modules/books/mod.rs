pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;

use folio_http::error::AppError;
use folio_kernel::settings::Environment;
use folio_kernel::{InitCtx, Module};
use folio_store::{BookId, CatalogBook, Store, StoreError};

use models::{CreateBookRequest, UpdateAvailabilityRequest};

/// Books module: the catalog collaborator the interest engine reads from.
pub struct BooksModule {
    store: Arc<Store>,
}

impl BooksModule {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.environment == Environment::Local && self.store.catalog.is_empty() {
            seed_demo_catalog(&self.store);
        }
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route("/{id}", get(get_book))
            .route("/{id}/availability", put(set_availability))
            .route("/health", get(health_check))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/CreateBook"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "409": {
                                "description": "Slug already taken",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            },
                            "422": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch one book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": {
                                    "type": "string",
                                    "format": "uuid"
                                }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}/availability": {
                    "put": {
                        "summary": "Toggle whether the book accepts interest",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": {
                                    "type": "string",
                                    "format": "uuid"
                                }
                            }
                        ],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/UpdateAvailability"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": {
                                        "schema": {
                                            "type": "string"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid",
                                "description": "Unique identifier for the book"
                            },
                            "title": {
                                "type": "string",
                                "description": "Title of the book"
                            },
                            "author": {
                                "type": "string",
                                "description": "Author of the book"
                            },
                            "slug": {
                                "type": "string",
                                "description": "URL-friendly slug for the book"
                            },
                            "image_url": {
                                "type": "string",
                                "format": "uri",
                                "description": "Cover image URL"
                            },
                            "total_copies": {
                                "type": "integer",
                                "description": "Copies the shop stocks"
                            },
                            "available_copies": {
                                "type": "integer",
                                "description": "Copies currently on hand"
                            },
                            "is_available": {
                                "type": "boolean",
                                "description": "Whether the book accepts new interest"
                            }
                        },
                        "required": ["id", "title", "author", "slug", "total_copies", "available_copies", "is_available"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string",
                                "description": "Title of the book"
                            },
                            "author": {
                                "type": "string",
                                "description": "Author of the book"
                            },
                            "slug": {
                                "type": "string",
                                "description": "URL-friendly slug for the book"
                            },
                            "image_url": {
                                "type": "string",
                                "format": "uri",
                                "description": "Cover image URL"
                            },
                            "total_copies": {
                                "type": "integer",
                                "description": "Copies the shop stocks"
                            }
                        },
                        "required": ["title", "author", "slug", "total_copies"]
                    },
                    "UpdateAvailability": {
                        "type": "object",
                        "properties": {
                            "is_available": {
                                "type": "boolean"
                            }
                        },
                        "required": ["is_available"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Demo catalog for local development.
fn seed_demo_catalog(store: &Store) {
    let seeds = [
        (
            "The Rust Programming Language",
            "Steve Klabnik",
            "rust-programming-language",
            3u32,
        ),
        ("Programming Rust", "Jim Blandy", "programming-rust", 2u32),
    ];
    for (title, author, slug, copies) in seeds {
        let book = CatalogBook {
            id: BookId::generate(),
            title: title.to_string(),
            author: author.to_string(),
            slug: slug.to_string(),
            image_url: None,
            total_copies: copies,
            available_copies: copies,
            is_available: true,
        };
        if store.catalog.insert(book).is_err() {
            tracing::debug!(slug, "demo book already present");
        }
    }
    tracing::info!(count = store.catalog.len(), "seeded demo catalog");
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

/// List books endpoint
async fn list_books(State(store): State<Arc<Store>>) -> Json<Vec<CatalogBook>> {
    Json(store.catalog.list())
}

/// Create book endpoint
async fn create_book(
    State(store): State<Arc<Store>>,
    Json(body): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<CatalogBook>), AppError> {
    let mut details = Vec::new();
    for (field, value) in [
        ("title", &body.title),
        ("author", &body.author),
        ("slug", &body.slug),
    ] {
        if value.trim().is_empty() {
            details.push(json!({"field": field, "error": "required"}));
        }
    }
    if !details.is_empty() {
        return Err(AppError::validation(details, "Book fields must not be empty"));
    }

    let book = CatalogBook {
        id: BookId::generate(),
        title: body.title,
        author: body.author,
        slug: body.slug,
        image_url: body.image_url,
        total_copies: body.total_copies,
        available_copies: body.total_copies,
        is_available: true,
    };
    match store.catalog.insert(book.clone()) {
        Ok(()) => Ok((StatusCode::CREATED, Json(book))),
        Err(StoreError::Duplicate) => Err(AppError::conflict(
            vec![json!({"field": "slug", "error": "taken"})],
            "A book with this slug already exists",
        )),
        Err(err) => Err(AppError::Internal(anyhow::anyhow!(err))),
    }
}

/// Fetch one book endpoint
async fn get_book(
    State(store): State<Arc<Store>>,
    Path(id): Path<BookId>,
) -> Result<Json<CatalogBook>, AppError> {
    store
        .catalog
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book not found"))
}

/// Availability toggle endpoint
async fn set_availability(
    State(store): State<Arc<Store>>,
    Path(id): Path<BookId>,
    Json(body): Json<UpdateAvailabilityRequest>,
) -> Result<Json<CatalogBook>, AppError> {
    store
        .catalog
        .set_availability(id, body.is_available)
        .map(Json)
        .map_err(|_| AppError::not_found("Book not found"))
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<Store>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    fn request(slug: &str) -> CreateBookRequest {
        CreateBookRequest {
            title: "The Trial".to_string(),
            author: "Franz Kafka".to_string(),
            slug: slug.to_string(),
            image_url: None,
            total_copies: 2,
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let store = Arc::new(Store::new());
        let err = create_book(
            State(store),
            Json(CreateBookRequest {
                title: "  ".to_string(),
                ..request("the-trial")
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = Arc::new(Store::new());
        let (status, Json(created)) = create_book(State(store.clone()), Json(request("the-trial")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.available_copies, 2);

        let Json(fetched) = get_book(State(store), Path(created.id)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let store = Arc::new(Store::new());
        create_book(State(store.clone()), Json(request("the-trial")))
            .await
            .unwrap();
        let err = create_book(State(store), Json(request("the-trial")))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn demo_seed_is_idempotent() {
        let store = Store::new();
        seed_demo_catalog(&store);
        seed_demo_catalog(&store);
        assert_eq!(store.catalog.len(), 2);
    }
}
