use clap::Parser;
use env_logger::Env;
use log::info;

use proxypool::app;
use proxypool::config;
use proxypool::store;

#[derive(Parser, Debug)]
#[command(name = "proxypool", about = "crawl, check and serve proxy nodes")]
struct Args {
    /// Path to the config file
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Debug output
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(Env::default().default_filter_or(default_level));
    if args.debug {
        log::debug!("=======Debug Mode=======");
    }

    let config_path = args
        .config
        .or_else(|| std::env::var("CONFIG_FILE").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "config.yaml".to_string());
    config::set_file_path(&config_path);

    app::init_config_and_getters().await?;

    store::init_from_config(&config::current().database_url);

    if config::current().save_proxy_file.is_empty() {
        info!("Do the first crawl...");
        tokio::spawn(app::crawl_go_with_sync());
        app::cron::run().await;
    } else {
        info!("Do the onetime crawl...");
        app::crawl_go_with_sync().await;
    }
    Ok(())
}
