pub mod conversion;
pub mod memberships;
pub mod roster;
pub mod submissions;
