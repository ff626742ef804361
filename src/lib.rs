//! Credit Application Portal Library
//!
//! Onboarding and profile portal for credit applicants. The portal holds no
//! data of its own: identity checks, one-time codes, profile sections, credit
//! reports, geography and market data all live behind upstream HTTP APIs,
//! and the portal orchestrates them around a cookie-backed session.
//!
//! # Modules
//!
//! - `api`: API-layer namespace (handlers, routes).
//! - `core`: Domain-layer namespace (models, validation, session, errors).
//! - `integrations`: External service namespace (gateway client, envelope).
//! - `obs`: Observability and masking of personal data.
//! - `config`: Configuration management.
//! - `envelope`: Response envelope normalization.
//! - `errors`: Error handling types.
//! - `gateway_client`: Client for every upstream API.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `money`: Exact decimal amounts on the wire.
//! - `reference`: Occupation, sector and bank lists.
//! - `regions`: Built-in province and district fallback.
//! - `routes`: Route table and middleware.
//! - `session`: Session store and onboarding state.
//! - `token`: Subject id recovery from bearer tokens.
//! - `validation`: Form input rules.

pub mod api;
pub mod core;
pub mod integrations;
pub mod obs;

pub mod config;
pub mod envelope;
pub mod errors;
pub mod gateway_client;
pub mod handlers;
pub mod models;
pub mod money;
pub mod reference;
pub mod regions;
pub mod routes;
pub mod session;
pub mod token;
pub mod validation;
