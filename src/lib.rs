//! Shortspace - a multi-tenant short-link resolution and click analytics engine
//!
//! This library provides the core functionality for the Shortspace service:
//! tenant-aware slug/domain resolution, durable click recording that never
//! blocks the redirect, and on-demand analytics aggregation.
//!
//! # Architecture
//! - `services`: resolution, quota, analytics and geoip business logic
//! - `analytics`: the buffered click recording pipeline
//! - `storage`: SeaORM storage backend and data access
//! - `api`: HTTP services (redirect surface + internal dashboard API)
//! - `config`: configuration management
//! - `runtime`: server startup and background tasks
//! - `system`: logging and platform utilities

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
