//! OpenID Connect Dynamic Client Registration core.
//!
//! Provides the claim catalog, client metadata model, validation pipeline,
//! and registration lifecycle management for OIDC Dynamic Client
//! Registration 1.0. HTTP routing, token grants, and signing machinery are
//! external collaborators consumed through the traits in [`oidc`] and
//! [`storage`].

pub mod config;
pub mod errors;
pub mod oidc;
pub mod storage;
