use std::io::{Read, Write};

use cascade_agent::ide_completion::{self, IDE_TIMEOUT, IDE_TITLE};
use cascade_agent::llmclient::{api_key_from_env, LLMClient, OPENROUTER_URL};
use cascade_agent::settings::Settings;

#[tokio::main]
async fn main() {
    // stdout carries the suggestion; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let mut raw = String::new();
    let suggestion = match std::io::stdin().read_to_string(&mut raw) {
        Ok(_) => {
            let settings = Settings::load_or_default(Settings::default_path().as_deref());
            let client = LLMClient::new(OPENROUTER_URL, api_key_from_env(&settings), IDE_TITLE, IDE_TIMEOUT);
            ide_completion::suggest(&client, &raw).await
        }
        Err(e) => {
            tracing::warn!("failed to read stdin: {e}");
            String::new()
        }
    };

    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(suggestion.as_bytes());
    let _ = stdout.flush();
}
