#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod normalize;
pub mod time;
pub mod validate;

pub use error::Error;
pub use normalize::{ParseError, normalize};
pub use time::Clock;
pub use validate::{SchemaError, Violation, ViolationRule, validate};
