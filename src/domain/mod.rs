//! Domain model: users, trips and their lifecycle, the pluggable fare and
//! driver-selection policies, and the storage port the engine depends on.

pub mod fare;
pub mod ports;
pub mod selection;
pub mod trip;
pub mod user;
