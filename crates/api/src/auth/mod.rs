//! Authentication primitives.
//!
//! Access tokens are issued by the surrounding application; this service
//! only validates them.

pub mod jwt;
