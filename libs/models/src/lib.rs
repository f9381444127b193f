//! Database model definitions

#[macro_use]
extern crate tracing;

mod crew;
mod guest;
mod member;
mod reservation;

pub mod schema;

pub use crew::*;
pub use guest::*;
pub use member::*;
pub use reservation::*;
