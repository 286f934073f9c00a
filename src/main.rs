use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use multistep::client::{HttpTransport, WizardTransport};
use multistep::config::Config;
use multistep::logging;
use multistep::rest::{ApiDoc, ApiState, RestApiServer, RestApiStatus};

#[derive(Parser)]
#[command(name = "multistep")]
#[command(about = "Server-driven multi-step form wizards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (default from config: 7009)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the OpenAPI document as JSON
    Openapi,

    /// Load one step from a running server and print the response
    #[command(allow_negative_numbers = true)]
    LoadStep {
        uniqueid: String,
        recordid: i64,
        /// Step number; -1 review, -3 confirmed submit
        step: i64,

        /// Server base url
        #[arg(short, long, default_value = "http://127.0.0.1:7009")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let mut config = Config::load(cli.config.as_deref())?;

    let _logging_handle = logging::init_logging(&config, cli.debug)?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_serve(config).await?;
        }
        Commands::Openapi => {
            let json = ApiDoc::json().context("Failed to generate OpenAPI document")?;
            println!("{}", json);
        }
        Commands::LoadStep {
            uniqueid,
            recordid,
            step,
            url,
        } => {
            cmd_load_step(&url, &uniqueid, recordid, step).await?;
        }
    }

    Ok(())
}

async fn cmd_serve(config: Config) -> Result<()> {
    println!("Starting REST API server...");
    println!("  Address: http://{}", config.bind_addr());
    println!("  Endpoints:");
    println!("    GET    /api/v1/health                                Health check");
    println!("    POST   /api/v1/wizards                               Create wizard");
    println!("    GET    /api/v1/wizards/:uniqueid/:recordid/steps/:step  Load step");
    println!("    POST   /api/v1/wizards/:uniqueid/:recordid/steps/:step  Submit step");
    println!("    POST   /api/v1/wizards/:uniqueid/:recordid/steps/:step/refresh  Refresh step");
    println!("    DELETE /api/v1/wizards/:uniqueid/:recordid           Abandon wizard");
    println!("  Docs: /swagger-ui");
    println!();

    let state = ApiState::new(config).context("Failed to initialize wizard state")?;
    let server = RestApiServer::new(state);
    server.start().map_err(anyhow::Error::msg)?;

    // Give the listener a moment to bind before reporting success
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    if let RestApiStatus::Error(e) = server.status() {
        anyhow::bail!("REST API failed to start: {}", e);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    server.stop();
    server.wait().await;
    Ok(())
}

async fn cmd_load_step(url: &str, uniqueid: &str, recordid: i64, step: i64) -> Result<()> {
    let transport = HttpTransport::new(url)?;
    let response = transport.load_step(uniqueid, recordid, step).await?;

    if !response.returnurl.is_empty() {
        println!("Wizard complete, return to {}", response.returnurl);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
