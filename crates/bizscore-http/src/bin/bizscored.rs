use std::process::ExitCode;

use bizscore_http::telemetry::init_tracing;
use bizscore_http::{HttpServer, ScoringService, ServerConfig};
use tracing::{error, info};

fn main() -> ExitCode {
    init_tracing();
    let config = ServerConfig::from_env();

    let service = match ScoringService::load(&config.model_path) {
        Ok(service) => service,
        Err(err) => {
            error!(
                path = %config.model_path.display(),
                error = %err,
                "failed to load model artifact"
            );
            return ExitCode::FAILURE;
        }
    };
    let info = service.info();
    info!(
        model = %info.name,
        kind = info.kind,
        n_features = info.n_features,
        "model loaded"
    );

    let server = HttpServer::new(service, config);
    match server.serve() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "http server stopped");
            ExitCode::FAILURE
        }
    }
}
