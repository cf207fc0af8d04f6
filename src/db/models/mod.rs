//! Database models split into domain-specific modules.

pub mod amenity;
pub mod common;
pub mod place;
pub mod review;
pub mod stats;
pub mod user;

pub use amenity::*;
pub use common::*;
pub use place::*;
pub use review::*;
pub use stats::*;
pub use user::*;
