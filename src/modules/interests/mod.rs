pub mod error;
pub mod models;
pub mod queries;
pub mod reconcile;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;

use folio_http::error::AppError;
use folio_kernel::{InitCtx, Module, Settings};
use folio_store::{
    BookId, BookQueueRecord, InterestId, Page, RetryPolicy, Store, UserId, UserInterestRecord,
};

use models::{
    ChangeStatusRequest, CreateInterestRequest, CreateInterestResponse, InterestAggregate,
    PageParams,
};
use queries::InterestQueries;
use reconcile::Reconciler;
use service::InterestService;

/// Interests module: reader registrations, admin triage of per-book queues,
/// and the cheap per-book aggregate read.
pub struct InterestsModule {
    state: InterestsState,
    reconciler: Arc<Reconciler>,
    reconcile_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[derive(Clone)]
struct InterestsState {
    service: Arc<InterestService>,
    queries: Arc<InterestQueries>,
}

impl InterestsModule {
    pub fn new(store: Arc<Store>, retry: RetryPolicy) -> Self {
        Self {
            state: InterestsState {
                service: Arc::new(InterestService::new(store.clone(), retry)),
                queries: Arc::new(InterestQueries::new(store.clone())),
            },
            reconciler: Arc::new(Reconciler::new(store)),
            reconcile_task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Module for InterestsModule {
    fn name(&self) -> &'static str {
        "interests"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "interests module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(create_interest))
            .route("/{id}/status", put(change_status))
            .route("/book/{book_id}", get(book_queue))
            .route("/book/{book_id}/aggregate", get(book_aggregate))
            .route("/user/{user_id}", get(user_interests))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Register interest in a book",
                        "tags": ["Interests"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/CreateInterest"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Interest registered",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/InterestCreated"
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
                            },
                            "409": {
                                "description": "Already interested, or book not accepting interest",
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
                "/{id}/status": {
                    "put": {
                        "summary": "Change the status of an interest",
                        "tags": ["Interests"],
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
                                        "$ref": "#/components/schemas/ChangeStatus"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated interest record",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/QueueInterest"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Interest not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            },
                            "422": {
                                "description": "Illegal status change",
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
                "/book/{book_id}": {
                    "get": {
                        "summary": "Page through a book's interest queue, newest first",
                        "tags": ["Interests"],
                        "parameters": [
                            {
                                "name": "book_id",
                                "in": "path",
                                "required": true,
                                "schema": {
                                    "type": "string",
                                    "format": "uuid"
                                }
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": {
                                    "type": "integer"
                                }
                            },
                            {
                                "name": "offset",
                                "in": "query",
                                "schema": {
                                    "type": "integer"
                                }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of the queue",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/QueuePage"
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
                "/book/{book_id}/aggregate": {
                    "get": {
                        "summary": "Denormalized interest count and copy availability",
                        "tags": ["Interests"],
                        "parameters": [
                            {
                                "name": "book_id",
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
                                "description": "Aggregate state for the book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/InterestAggregate"
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
                "/user/{user_id}": {
                    "get": {
                        "summary": "A reader's own interests with book snapshots",
                        "tags": ["Interests"],
                        "parameters": [
                            {
                                "name": "user_id",
                                "in": "path",
                                "required": true,
                                "schema": {
                                    "type": "string",
                                    "format": "uuid"
                                }
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": {
                                    "type": "integer"
                                }
                            },
                            {
                                "name": "offset",
                                "in": "query",
                                "schema": {
                                    "type": "integer"
                                }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of the reader's interests",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/UserInterestPage"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Interests health check",
                        "tags": ["Interests"],
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
                    "CreateInterest": {
                        "type": "object",
                        "properties": {
                            "book_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "user_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "user_name": {
                                "type": "string"
                            },
                            "user_email": {
                                "type": "string",
                                "format": "email"
                            }
                        },
                        "required": ["book_id", "user_id", "user_name", "user_email"]
                    },
                    "InterestCreated": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid"
                            }
                        },
                        "required": ["id"]
                    },
                    "ChangeStatus": {
                        "type": "object",
                        "properties": {
                            "book_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "user_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "contacted", "success", "cancelled"]
                            }
                        },
                        "required": ["book_id", "user_id", "status"]
                    },
                    "QueueInterest": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "book_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "user_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "user_name": {
                                "type": "string"
                            },
                            "user_email": {
                                "type": "string",
                                "format": "email"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "contacted", "success", "cancelled"]
                            },
                            "requested_at": {
                                "type": "string",
                                "format": "date-time"
                            },
                            "updated_at": {
                                "type": "string",
                                "format": "date-time"
                            }
                        },
                        "required": ["id", "book_id", "user_id", "status", "requested_at", "updated_at"]
                    },
                    "QueuePage": {
                        "type": "object",
                        "properties": {
                            "items": {
                                "type": "array",
                                "items": {
                                    "$ref": "#/components/schemas/QueueInterest"
                                }
                            },
                            "has_more": {
                                "type": "boolean"
                            }
                        },
                        "required": ["items", "has_more"]
                    },
                    "UserInterest": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "book_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "book_title": {
                                "type": "string"
                            },
                            "book_author": {
                                "type": "string"
                            },
                            "book_image": {
                                "type": "string",
                                "format": "uri"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "contacted", "success", "cancelled"]
                            },
                            "requested_at": {
                                "type": "string",
                                "format": "date-time"
                            },
                            "updated_at": {
                                "type": "string",
                                "format": "date-time"
                            }
                        },
                        "required": ["id", "book_id", "book_title", "book_author", "status", "requested_at", "updated_at"]
                    },
                    "UserInterestPage": {
                        "type": "object",
                        "properties": {
                            "items": {
                                "type": "array",
                                "items": {
                                    "$ref": "#/components/schemas/UserInterest"
                                }
                            },
                            "has_more": {
                                "type": "boolean"
                            }
                        },
                        "required": ["items", "has_more"]
                    },
                    "InterestAggregate": {
                        "type": "object",
                        "properties": {
                            "book_id": {
                                "type": "string",
                                "format": "uuid"
                            },
                            "interest_count": {
                                "type": "integer"
                            },
                            "total_copies": {
                                "type": "integer"
                            },
                            "available_copies": {
                                "type": "integer"
                            },
                            "is_available": {
                                "type": "boolean"
                            }
                        },
                        "required": ["book_id", "interest_count", "total_copies", "available_copies", "is_available"]
                    }
                }
            }
        }))
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let interval = ctx.settings.store.reconcile_interval();
        let handle = Arc::clone(&self.reconciler).spawn(interval);
        *self.reconcile_task.lock() = Some(handle);
        tracing::info!(
            module = self.name(),
            interval_secs = interval.as_secs(),
            "interests module started, reconciliation running"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if let Some(handle) = self.reconcile_task.lock().take() {
            handle.abort();
        }
        tracing::info!(module = self.name(), "interests module stopped");
        Ok(())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "interests module is healthy"
}

/// Register a reader's interest in a book
async fn create_interest(
    State(state): State<InterestsState>,
    Json(body): Json<CreateInterestRequest>,
) -> Result<(StatusCode, Json<CreateInterestResponse>), AppError> {
    let id = state.service.create_interest(body).await?;
    Ok((StatusCode::CREATED, Json(CreateInterestResponse { id })))
}

/// Move an interest through the triage workflow
async fn change_status(
    State(state): State<InterestsState>,
    Path(id): Path<InterestId>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<Json<BookQueueRecord>, AppError> {
    let record = state.service.change_status(id, body).await?;
    Ok(Json(record))
}

/// Page through a book's queue in triage order
async fn book_queue(
    State(state): State<InterestsState>,
    Path(book_id): Path<BookId>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<BookQueueRecord>>, AppError> {
    let page = state
        .queries
        .book_queue(book_id, params.limit(), params.offset())?;
    Ok(Json(page))
}

/// Cheap aggregate for one book
async fn book_aggregate(
    State(state): State<InterestsState>,
    Path(book_id): Path<BookId>,
) -> Result<Json<InterestAggregate>, AppError> {
    let aggregate = state.queries.aggregate(book_id)?;
    Ok(Json(aggregate))
}

/// A reader's own interests
async fn user_interests(
    State(state): State<InterestsState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<PageParams>,
) -> Json<Page<UserInterestRecord>> {
    Json(
        state
            .queries
            .user_interests(user_id, params.limit(), params.offset()),
    )
}

/// Create a new instance of the interests module
pub fn create_module(store: Arc<Store>, settings: &Settings) -> Arc<dyn Module> {
    Arc::new(InterestsModule::new(store, settings.store.retry_policy()))
}
