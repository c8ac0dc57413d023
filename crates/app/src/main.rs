use std::time::Duration;

use clap::Parser;
use engine::Engine;
use server::ServerState;
use settings::{CipherKind, Remote, Settings};
use snapshot::{DirStore, DriveStore, GpgCipher, NativeCipher, Snapshot, SnapshotConfig};

use crate::error::Result;

mod error;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "expenses", version)]
struct Args {
    /// Config file path (TOML). A missing file is fine.
    #[arg(long, env = "EXPENSES_CONFIG", default_value = "settings.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::new(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expenses={level},server={level},engine={level},snapshot={level}",
            level = settings.app.level
        ))
        .init();

    let (engine, snapshot) = match &settings.sync {
        Some(sync) => {
            tracing::info!("Found sync settings, running in snapshot mode...");
            let snapshot = build_snapshot(sync)?;
            let engine = Engine::builder()
                .database_path(&sync.database)
                .create_if_missing(false)
                .build()
                .await?;
            (engine, Some(snapshot))
        }
        None => {
            let engine = Engine::builder()
                .database_path(&settings.server.database)
                .build()
                .await?;
            engine.ensure_schema().await?;
            (engine, None)
        }
    };

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let state = ServerState::new(engine, snapshot).session_idle_timeout(Duration::from_secs(
        settings.server.session_idle_minutes.saturating_mul(60),
    ));
    server::run_with_listener(state, listener).await?;

    Ok(())
}

fn build_snapshot(sync: &settings::SyncSettings) -> Result<Snapshot> {
    let builder = Snapshot::builder().config(SnapshotConfig {
        file_id: sync.file_id.clone(),
        database: sync.database.clone(),
        encrypted: sync.encrypted.clone(),
        backup_dir: sync.backup_dir.clone(),
    });

    let builder = match sync.cipher {
        CipherKind::Gpg => {
            let gpg = GpgCipher::new(sync.gpg_program.clone());
            match &sync.gpg_homedir {
                Some(homedir) => builder.cipher(gpg.with_homedir(homedir.clone())),
                None => builder.cipher(gpg),
            }
        }
        CipherKind::Native => builder.cipher(NativeCipher::default()),
    };

    let builder = match &sync.remote {
        Remote::Drive { config_dir } => builder.remote(DriveStore::new(config_dir)),
        Remote::Directory { path } => builder.remote(DirStore::new(path.clone())),
    };

    Ok(builder.build()?)
}
