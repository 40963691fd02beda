use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use utakata::config::Config;
use utakata::render::{FontProvider, RenderOptions, TextRenderer};
use utakata::serve::LinkServer;
use utakata::store::LinkStore;

/// Utakata - ephemeral view-limited image links with caption and watermark rendering
#[derive(Parser, Debug)]
#[command(name = "utakata")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the link server (the default)
    Serve,
    /// Render an image, register a view-limited link and print the URL
    Create(CreateArgs),
}

#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Image file to publish
    file: PathBuf,

    /// Number of views before the link expires
    #[arg(short = 'n', long, default_value_t = 1)]
    views: i64,

    /// Caption drawn on a bar along the bottom edge
    #[arg(long)]
    caption: Option<String>,

    /// Watermark text stamped over the image
    #[arg(long)]
    watermark: Option<String>,

    /// Tile the watermark across the whole image instead of the center
    #[arg(long, requires = "watermark")]
    tiled: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = Config::load(&args.config).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    utakata::logging::init_subscriber(&config.logging);

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        data_dir = %config.storage.data_dir,
        "Configuration loaded successfully"
    );

    if args.test {
        println!("Configuration OK");
        return;
    }

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Create(create) => run_create(config, create).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(
        LinkStore::open_with_retries(&config.storage.data_dir, config.storage.max_create_retries)
            .await?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let server = LinkServer::new(store, &config.server);
    server.start(shutdown_rx).await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

async fn run_create(config: Config, args: CreateArgs) -> anyhow::Result<()> {
    let mut bytes = tokio::fs::read(&args.file).await?;

    let fonts = FontProvider::new(config.render.font_path.as_deref().map(Path::new));
    let renderer = TextRenderer::new(
        fonts,
        RenderOptions {
            jpeg_quality: config.render.jpeg_quality,
            watermark_angle: config.render.watermark_angle_degrees,
        },
    );

    if let Some(caption) = args.caption.as_deref() {
        bytes = renderer.caption_bottom(&bytes, caption)?;
    }
    if let Some(text) = args.watermark.as_deref() {
        bytes = if args.tiled {
            renderer.watermark_tiled(&bytes, text)?
        } else {
            renderer.watermark_center(&bytes, text)?
        };
    }

    let store =
        LinkStore::open_with_retries(&config.storage.data_dir, config.storage.max_create_retries)
            .await?;
    let link = store.create(&bytes, args.views).await?;

    tracing::info!(views = link.remaining, "Link created");
    println!("{}", config.share_url(&link.token));

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
