use std::io::{self, Write};
use std::process::ExitCode;

use bizscore_chat::telemetry::init_tracing;
use bizscore_chat::{ChatConfig, ChatProvider, ChatRequest, OpenAiCompatibleChatProvider};
use tracing::{error, info};

const DEFAULT_PROMPT: &str = "Say hello.";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prompt = if args.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        args.join(" ")
    };

    let provider = match ChatConfig::from_env().and_then(OpenAiCompatibleChatProvider::new) {
        Ok(p) => p,
        Err(err) => {
            error!(error = %err, "chat provider setup failed");
            return ExitCode::FAILURE;
        }
    };

    match provider.complete(ChatRequest::single(prompt)).await {
        Ok(reply) => {
            info!(
                provider = provider.name(),
                model = %reply.model,
                tokens = reply.usage_tokens,
                "chat completion ok"
            );
            let mut out = io::stdout().lock();
            if writeln!(out, "{}", reply.content).is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "chat completion failed");
            ExitCode::FAILURE
        }
    }
}
