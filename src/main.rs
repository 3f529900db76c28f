use tracing::{error, info, span, Level};

use swiftstore::{adapters, backup, config, storage};

fn main() {
    tracing_subscriber::fmt().json().init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let matches = clap::Command::new("swiftstore-backup")
        .about("dump the configured database and upload it to object storage")
        .arg(clap::Arg::new("DATABASE").required(false).index(1))
        .get_matches();

    let mut backup_cfg = match config::BackupConfig::from_env() {
        Err(err) => {
            error!(error_message=%err, error_group="config");
            std::process::exit(1);
        }
        Ok(cfg) => cfg,
    };

    if let Some(database) = matches.get_one::<String>("DATABASE") {
        backup_cfg.database.name = database.clone();
    }
    info!(database=%backup_cfg.database.name, container=%backup_cfg.container, "args");

    let storage_cfg = match config::Config::from_env() {
        Err(err) => {
            error!(error_message=%err, error_group="config");
            std::process::exit(1);
        }
        Ok(cfg) => cfg,
    };

    let mut storage = storage::SwiftStorage::new(
        storage_cfg.with_container(&backup_cfg.container),
        Box::new(adapters::http::HttpTransport::new()),
    );

    match backup::pg_backup(&backup_cfg, &mut storage) {
        Err(err) => {
            error!(error_message=%err, error_group="backup");
            std::process::exit(1);
        }
        Ok(name) => info!(name=%name, "uploaded"),
    }
}
