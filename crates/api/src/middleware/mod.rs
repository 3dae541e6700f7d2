//! Request extractors for authentication and role checks.
//!
//! - [`auth::AuthUser`] -- any valid Bearer token.
//! - [`rbac::RequireTalent`] -- the `talent` role.
//! - [`rbac::RequireStudio`] -- the `studio` role.

pub mod auth;
pub mod rbac;
