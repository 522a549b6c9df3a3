pub mod artifact;
pub mod backends;
pub mod error;
pub mod factory;
pub mod traits;

pub use artifact::*;
pub use error::ModelError;
pub use factory::*;
pub use traits::*;
