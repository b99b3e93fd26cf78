//! ThumbHub preparation tool.
//!
//! Prepares rendering settings and thumbnail metadata for a batch of pixel
//! sets on behalf of a user, then reports for each pixel set whether a
//! thumbnail request would be served from the store, regenerated, or
//! rendered directly.

use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use thumbhub_auth::{PermissionOracle, SessionSecurity};
use thumbhub_core::config::AppConfig;
use thumbhub_core::error::AppError;
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{GroupId, ImageId, PixelsId, ShareId, UserId};
use thumbhub_database::{DatabasePool, ThumbnailPersistence};
use thumbhub_entity::thumbnail::Dimensions;
use thumbhub_service::thumbnail::{PersistedSettingsFactory, ThumbnailContext};
use thumbhub_storage::{LocalStorageProvider, ThumbnailStore};

/// Prepare thumbnails for a batch of pixel sets.
#[derive(Debug, Parser)]
#[command(name = "thumbhub-prepare", version)]
struct Cli {
    /// Configuration overlay to load from `config/{env}.toml`.
    #[arg(long, default_value = "development")]
    env: String,

    /// The acting user.
    #[arg(long)]
    user: UserId,

    /// Group to work in (defaults to the user's default group).
    #[arg(long)]
    group: Option<GroupId>,

    /// Share the session was opened through.
    #[arg(long)]
    share: Option<ShareId>,

    /// Prepare thumbnails for this user instead of the acting user.
    #[arg(long)]
    target: Option<UserId>,

    /// Longest side of the thumbnails.
    #[arg(long, conflicts_with = "size")]
    longest_side: Option<u32>,

    /// Fixed thumbnail size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_dimensions)]
    size: Option<Dimensions>,

    /// Leave missing metadata uncreated (fixed sizes only).
    #[arg(long, requires = "size")]
    no_create: bool,

    /// Create default rendering settings where none exist.
    #[arg(long)]
    ensure_settings: bool,

    /// Treat the ids as image ids.
    #[arg(long)]
    images: bool,

    /// Pixel set ids (or image ids with `--images`).
    #[arg(required = true)]
    ids: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "Thumbnail preparation failed");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting thumbhub-prepare v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;
    thumbhub_database::migration::run_migrations(db.pool()).await?;

    let security = SessionSecurity::load(&db, cli.user, cli.group, cli.share).await?;
    let oracle: Arc<dyn PermissionOracle> = Arc::new(security);
    let persistence: Arc<dyn ThumbnailPersistence> = Arc::new(db.thumbnail_persistence());

    let provider = LocalStorageProvider::new(&config.storage.root).await?;
    let store = ThumbnailStore::new(Arc::new(provider), &config.storage.thumbnail_dir);
    let factory = Arc::new(PersistedSettingsFactory::new(Arc::clone(&persistence)));

    let mut ctx = ThumbnailContext::new(
        persistence,
        oracle,
        factory,
        store,
        config.thumbnail.clone(),
        cli.target.unwrap_or(cli.user),
    );

    let pixels_ids = if cli.images {
        let image_ids = parse_ids::<ImageId>(&cli.ids)?;
        ctx.prepare_settings_by_image_ids(&image_ids).await?
    } else {
        let pixels_ids = parse_ids::<PixelsId>(&cli.ids)?;
        ctx.prepare_settings(&pixels_ids).await?;
        pixels_ids
    };

    if cli.ensure_settings {
        let created = ctx.ensure_settings_exist(&pixels_ids).await?;
        tracing::info!(count = created.len(), "Created default rendering settings");
    }

    match cli.size {
        Some(size) => {
            ctx.prepare_metadata(&pixels_ids, size, !cli.no_create)
                .await?
        }
        None => {
            let longest_side = cli
                .longest_side
                .unwrap_or(config.thumbnail.default_longest_side);
            ctx.prepare_metadata_by_longest_side(&pixels_ids, longest_side)
                .await?
        }
    }

    for pixels_id in pixels_ids {
        println!("{pixels_id}\t{}", status(&ctx, pixels_id).await);
    }

    db.close().await;
    Ok(())
}

/// One-line summary of what a thumbnail request would do for a pixel set.
async fn status(ctx: &ThumbnailContext, pixels_id: PixelsId) -> String {
    let Some(settings) = ctx.settings(pixels_id) else {
        return "no-settings".to_string();
    };
    let metadata = match ctx.metadata(pixels_id) {
        Ok(m) => m,
        Err(e) if e.is_no_thumbnail() => {
            return format!("settings={}\trender-direct", settings.owner_id);
        }
        Err(e) => return format!("error: {e}"),
    };

    let verdict = match ctx.is_thumbnail_cached(pixels_id).await {
        Ok(true) => "cached".to_string(),
        Ok(false) => "regenerate".to_string(),
        Err(e) => format!("error: {e}"),
    };
    format!(
        "settings={}\tthumbnail={} {}\towner={}\tdirty={}\t{verdict}",
        settings.owner_id,
        metadata.id,
        metadata.dimensions(),
        metadata.owner_id,
        ctx.is_dirty(pixels_id),
    )
}

fn parse_ids<T>(raw: &[String]) -> AppResult<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.iter()
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| AppError::validation(format!("Invalid id '{s}': {e}")))
        })
        .collect()
}

fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(Dimensions::new(width, height))
}
