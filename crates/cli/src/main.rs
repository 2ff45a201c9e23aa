use anyhow::Context;
use clap::{Parser, Subcommand};
use ortc::cluster::{BalancerClient, ClusterResolver};
use ortc::config;
use ortc::{MessageClient, SendParams};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ortc")]
#[command(about = "ORTC CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: ORTC_CONFIG_PATH or ~/.ortc/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send a message to a channel. Flags override values from the config file and environment.
    Send {
        /// Config file path (default: ORTC_CONFIG_PATH or ~/.ortc/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Server URL (or balancer URL with --cluster)
        #[arg(long)]
        url: Option<String>,

        /// Resolve the server through the cluster balancer first
        #[arg(long)]
        cluster: bool,

        #[arg(long, value_name = "KEY")]
        app_key: Option<String>,

        #[arg(long, value_name = "KEY")]
        private_key: Option<String>,

        /// Authentication token
        #[arg(long)]
        token: Option<String>,

        /// Channel to publish to
        #[arg(long)]
        channel: String,

        /// Message body
        message: String,
    },

    /// Ask the cluster balancer which server to use and print it.
    Resolve {
        /// Config file path (default: ORTC_CONFIG_PATH or ~/.ortc/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Balancer URL
        #[arg(long)]
        url: Option<String>,

        #[arg(long, value_name = "KEY")]
        app_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("ortc {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            url,
            cluster,
            app_key,
            private_key,
            token,
            channel,
            message,
        }) => {
            let overrides = SendOverrides {
                url,
                cluster,
                app_key,
                private_key,
                token,
            };
            match run_send(config, overrides, channel, message).await {
                Ok(true) => println!("sent"),
                Ok(false) => {
                    println!("not sent");
                    std::process::exit(2);
                }
                Err(e) => {
                    log::error!("send failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Resolve {
            config,
            url,
            app_key,
        }) => {
            if let Err(e) = run_resolve(config, url, app_key).await {
                log::error!("resolve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = ortc::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

struct SendOverrides {
    url: Option<String>,
    cluster: bool,
    app_key: Option<String>,
    private_key: Option<String>,
    token: Option<String>,
}

fn required(value: Option<String>, what: &str) -> anyhow::Result<String> {
    value.with_context(|| format!("{} not set (pass a flag or add it to the config)", what))
}

async fn run_send(
    config_path: Option<PathBuf>,
    overrides: SendOverrides,
    channel: String,
    message: String,
) -> anyhow::Result<bool> {
    let (config, path) = config::load_config(config_path)?;
    log::debug!("using config {}", path.display());

    let params = SendParams {
        url: overrides
            .url
            .or_else(|| config.server.url.clone())
            .unwrap_or_default(),
        is_cluster: overrides.cluster || config.server.is_cluster,
        authentication_token: required(
            overrides
                .token
                .or_else(|| config::resolve_authentication_token(&config)),
            "authentication token",
        )?,
        application_key: required(
            overrides
                .app_key
                .or_else(|| config::resolve_application_key(&config)),
            "application key",
        )?,
        private_key: required(
            overrides
                .private_key
                .or_else(|| config::resolve_private_key(&config)),
            "private key",
        )?,
        channel,
        message,
    };

    let client = MessageClient::new(&config)?;
    Ok(client.send_message(&params).await?)
}

async fn run_resolve(
    config_path: Option<PathBuf>,
    url: Option<String>,
    app_key: Option<String>,
) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let url = required(url.or_else(|| config.server.url.clone()), "server url")?;
    let app_key = required(
        app_key.or_else(|| config::resolve_application_key(&config)),
        "application key",
    )?;
    let server = BalancerClient::from_config(&config)?
        .resolve(&url, &app_key)
        .await?;
    println!("{}", server);
    Ok(())
}
