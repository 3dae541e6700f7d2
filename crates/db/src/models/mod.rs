//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Where editing is allowed, a `Deserialize` update DTO (all `Option` fields)

pub mod account;
pub mod lead_submission;
pub mod membership;
pub mod roster_entry;
pub mod shareable_code;
pub mod studio;
