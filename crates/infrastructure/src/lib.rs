//! PostgreSQL adapters and configuration for the resource permission store.

#![forbid(unsafe_code)]

mod config;
mod postgres_resource_permission_repository;

pub use config::{MIGRATOR, StoreConfig, connect_and_migrate};
pub use postgres_resource_permission_repository::{
    PostgresPermissionSession, PostgresResourcePermissionRepository,
};
