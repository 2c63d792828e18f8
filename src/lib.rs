//! Bike-sharing backend: catalog-driven CRUD over PostgreSQL, a bearer-token gate
//! on the app shell, and an SMS relay.

pub mod app;
pub mod auth;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sms;
pub mod sql;
pub mod state;
pub mod store;

pub use app::build_router;
pub use auth::{Identity, JwksVerifier, TokenVerifier};
pub use config::{builtin_config, resolve, FullConfig, ResolvedEntity, ResolvedModel};
pub use error::{AppError, ConfigError};
pub use migration::sync_schema;
pub use settings::Settings;
pub use sms::{NexmoGateway, SmsGateway};
pub use state::AppState;
pub use store::{check_connection, create_pool};
pub use service::CrudService;
