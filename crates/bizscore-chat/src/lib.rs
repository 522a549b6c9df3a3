pub mod config;
pub mod error;
pub mod providers;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::ProviderError;
pub use providers::OpenAiCompatibleChatProvider;
pub use traits::*;
pub use types::*;
