//! service-core: Shared infrastructure for the helpdesk microservices.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
