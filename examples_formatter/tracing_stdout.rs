use tracing_json_formatter::init::init_json_logging_with_config;
use tracing_json_formatter::JsonFormatterConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = JsonFormatterConfig::default()
        .with_field("level", "levelname")
        .with_field("logger", "name")
        .with_field("time", "asctime");
    init_json_logging_with_config(config)?;

    tracing::info!("service started");
    tracing::info!(user_id = 7, "user {} logged in", "alice");
    tracing::warn!(queue = "emails", depth = 1200);

    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");
    tracing::error!(error = &err as &dyn std::error::Error, "request failed");
    Ok(())
}
