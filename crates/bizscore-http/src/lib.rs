pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod protocol;
pub mod server;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::ScoreError;
pub use handler::{parse_score_request, ScoringService};
pub use protocol::{ErrorBody, ScoreResponse};
pub use server::HttpServer;
