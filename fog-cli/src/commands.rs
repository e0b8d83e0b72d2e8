//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Subcommand;
use fog_core::config::FogConfig;
use fog_core::storage::{LocalStorage, StorageBackend};
use fog_core::streaming::{MediaSource, SourceResolver};
use fog_core::{InMemoryCatalog, MediaCatalog, MediaId};
use tracing::{info, warn};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the media streaming server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Root directory of locally stored media
        #[arg(long)]
        storage_root: Option<PathBuf>,
        /// JSON manifest of media records
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Origin allowed to play media cross-origin (repeatable, `*` for any)
        #[arg(long = "allowed-origin")]
        allowed_origins: Vec<String>,
    },
    /// Report file count and size of the storage root
    StorageInfo {
        /// Root directory of locally stored media
        #[arg(long)]
        storage_root: Option<PathBuf>,
    },
    /// Check every catalog record against storage
    Verify {
        /// JSON manifest of media records
        #[arg(long)]
        catalog: PathBuf,
        /// Root directory of locally stored media
        #[arg(long)]
        storage_root: Option<PathBuf>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = FogConfig::from_env();

    match command {
        Commands::Serve {
            host,
            port,
            storage_root,
            catalog,
            allowed_origins,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(root) = storage_root {
                config.storage.root = root;
            }
            if catalog.is_some() {
                config.catalog.manifest = catalog;
            }
            if !allowed_origins.is_empty() {
                config.cors.allowed_origins = allowed_origins;
            }
            serve(config).await
        }
        Commands::StorageInfo { storage_root } => {
            if let Some(root) = storage_root {
                config.storage.root = root;
            }
            storage_info(&config).await
        }
        Commands::Verify {
            catalog,
            storage_root,
        } => {
            if let Some(root) = storage_root {
                config.storage.root = root;
            }
            config.catalog.manifest = Some(catalog);
            verify(&config).await
        }
    }
}

/// Start the media server
///
/// # Errors
/// - Catalog manifest could not be loaded
/// - Server failed to bind or crashed
pub async fn serve(config: FogConfig) -> anyhow::Result<()> {
    let catalog = match &config.catalog.manifest {
        Some(path) => InMemoryCatalog::from_manifest(path)
            .await
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => {
            warn!("No catalog manifest configured, serving an empty catalog");
            InMemoryCatalog::new()
        }
    };

    info!(
        "Serving {} media records from {}",
        catalog.len(),
        config.storage.root.display()
    );

    fog_web::run_server(config, Arc::new(catalog))
        .await
        .map_err(|e| anyhow!("Server failed: {e}"))
}

/// Print storage usage
///
/// # Errors
/// - Storage root could not be walked
pub async fn storage_info(config: &FogConfig) -> anyhow::Result<()> {
    let storage = LocalStorage::from_config(&config.storage);
    let info = storage
        .storage_info()
        .await
        .context("Failed to scan storage")?;

    println!("Storage path: {}", info.storage_path.display());
    println!("Total files:  {}", info.total_files);
    println!(
        "Total size:   {} bytes ({} MB)",
        info.total_size_bytes,
        info.total_size_mb()
    );

    Ok(())
}

/// Problem found while verifying a catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    /// Local reference with nothing stored behind it
    MissingFile { id: MediaId, path: String },
    /// Reference that cannot be streamed
    Unsupported { id: MediaId, reason: String },
}

impl std::fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyIssue::MissingFile { id, path } => {
                write!(f, "media {id}: stored file {path} is missing")
            }
            VerifyIssue::Unsupported { id, reason } => write!(f, "media {id}: {reason}"),
        }
    }
}

/// Collects every record whose audio cannot be served.
///
/// Records without audio are skipped; remote sources are only classified,
/// never fetched.
///
/// # Errors
/// - Catalog could not be listed
pub async fn find_issues(
    catalog: &dyn MediaCatalog,
    storage: &dyn StorageBackend,
    resolver: &SourceResolver,
) -> anyhow::Result<Vec<VerifyIssue>> {
    let mut issues = Vec::new();

    for resource in catalog.list().await? {
        let Some(reference) = resource.audio_reference() else {
            continue;
        };

        match resolver.classify(reference) {
            Ok(MediaSource::Local { path }) => {
                if !storage.exists(&path).await {
                    issues.push(VerifyIssue::MissingFile {
                        id: resource.id.clone(),
                        path,
                    });
                }
            }
            Ok(MediaSource::Remote { .. }) => {}
            Err(e) => issues.push(VerifyIssue::Unsupported {
                id: resource.id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(issues)
}

/// Verify a catalog manifest against storage
///
/// # Errors
/// - Catalog manifest could not be loaded
/// - Any record references missing or unsupported audio
pub async fn verify(config: &FogConfig) -> anyhow::Result<()> {
    let manifest = config
        .catalog
        .manifest
        .as_ref()
        .context("No catalog manifest given")?;
    let catalog = InMemoryCatalog::from_manifest(manifest)
        .await
        .with_context(|| format!("Failed to load catalog {}", manifest.display()))?;
    let storage = LocalStorage::from_config(&config.storage);
    let resolver = SourceResolver::from_config(&config.storage, &config.remote);

    let issues = find_issues(&catalog, &storage, &resolver).await?;
    if issues.is_empty() {
        println!("All {} media records are consistent", catalog.len());
        return Ok(());
    }

    for issue in &issues {
        println!("{issue}");
    }
    Err(anyhow!(
        "{} of {} media records are inconsistent",
        issues.len(),
        catalog.len()
    ))
}
