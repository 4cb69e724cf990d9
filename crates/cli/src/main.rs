mod call_commands;
mod credential_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "tokenrelay", about = "Refresh-token credential helper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Read config and the default credential store from this directory.
    #[arg(long, global = true, env = "TOKENRELAY_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored credentials.
    Credential {
        #[command(subcommand)]
        action: credential_commands::CredentialAction,
    },
    /// Exchange a credential's refresh token for a new access token.
    Refresh {
        #[arg(long)]
        name: String,
    },
    /// Refresh, then call the credential's test URL.
    Test {
        #[arg(long)]
        name: String,
    },
    /// Send an authenticated request.
    Request {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
    },
    /// Print the credential field schema as JSON.
    Schema,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(dir) = &cli.config_dir {
        tokenrelay_config::set_config_dir(dir.clone());
    }

    debug!(version = env!("CARGO_PKG_VERSION"), "tokenrelay starting");

    match cli.command {
        Commands::Credential { action } => credential_commands::handle_credential(action),
        Commands::Refresh { name } => call_commands::refresh(&name).await,
        Commands::Test { name } => call_commands::test(&name).await,
        Commands::Request {
            name,
            url,
            method,
            data,
        } => call_commands::request(&name, &method, &url, data.as_deref()).await,
        Commands::Schema => call_commands::schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_with_defaults() {
        let cli = Cli::try_parse_from([
            "tokenrelay",
            "request",
            "--name",
            "crm",
            "--url",
            "https://api.example.com/v1/contacts",
        ])
        .unwrap();
        match cli.command {
            Commands::Request { method, data, .. } => {
                assert_eq!(method, "GET");
                assert!(data.is_none());
            },
            _ => panic!("expected request"),
        }
        assert_eq!(cli.log_level, "warn");
        assert!(!cli.json_logs);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tokenrelay",
            "refresh",
            "--name",
            "crm",
            "--json-logs",
            "--config-dir",
            "/tmp/tr",
        ])
        .unwrap();
        assert!(cli.json_logs);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/tr")));
    }
}
