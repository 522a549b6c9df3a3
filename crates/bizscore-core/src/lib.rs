pub mod features;
pub mod request;
pub mod vocabulary;

pub use features::*;
pub use request::*;
pub use vocabulary::*;
