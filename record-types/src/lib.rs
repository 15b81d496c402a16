pub mod enumerated;
pub mod error;
pub mod model;
pub mod parser;

pub use enumerated::*;
pub use error::*;
pub use model::*;
pub use parser::*;
