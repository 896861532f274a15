//! Gamedex Browser
//!
//! Headless front end for the Gamedex library. Runs one browsing session
//! against the configured catalog and prints what a UI would display:
//!
//! 1. Load configuration (file, then `GAMEDEX_*` environment)
//! 2. Open the persistence backend
//! 3. Show a catalog page, the favorites, a single game, or the genre and
//!    platform lists

use anyhow::{Context, Result};
use clap::Parser;
use gamedex_api::{CatalogClient, Game, GameId, NamedRef};
use gamedex_config::{DEFAULT_CONFIG_FILE, GamedexConfig};
use gamedex_library::{Catalog, GameDetails, LibraryError, Persistence, View};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "gamedex-browser", version)]
#[command(about = "Browse the Gamedex game catalog", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Catalog page to show
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Show favorites instead of a catalog page
    #[arg(long)]
    favorites: bool,

    /// Show one game with its screenshots
    #[arg(long, allow_negative_numbers = true)]
    game: Option<i64>,

    /// List the catalog's genres
    #[arg(long)]
    genres: bool,

    /// List the catalog's parent platforms
    #[arg(long)]
    platforms: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup_logging();

    let args = Args::parse();
    info!("Gamedex Browser starting...");

    let config = GamedexConfig::load_layered(Some(&args.config))
        .context("Failed to load configuration")?;

    let store = gamedex_storage::open_store(&config.storage).with_context(|| {
        format!(
            "Failed to open {} storage at {}",
            config.storage.backend.as_str(),
            config.storage.path.display()
        )
    })?;

    let client = CatalogClient::new(&config.api).context("Failed to create catalog client")?;
    let catalog = Catalog::new(client, Persistence::new(store));

    if args.genres || args.platforms {
        if args.genres {
            print_named("Genres", catalog.genres().await);
        }
        if args.platforms {
            print_named("Platforms", catalog.platforms().await);
        }
        return Ok(());
    }

    if let Some(id) = args.game.map(GameId::from_raw) {
        match catalog.game_details(id).await {
            Ok(details) => print_details(&details),
            Err(e) => error!("{}", e),
        }
        return Ok(());
    }

    if args.favorites {
        catalog.show_favorites().await;
    } else {
        catalog.set_page(args.page).await;
    }

    if let Some(message) = catalog.error() {
        error!("Fetch failed: {}", message);
    }

    print_games(&catalog);
    Ok(())
}

/// Setup logging, `RUST_LOG` overrides the default level
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn print_games(catalog: &Catalog<CatalogClient>) {
    let games = catalog.displayed_games();

    if catalog.is_empty() {
        println!("No games to show");
        return;
    }

    for game in &games {
        let marker = if catalog.is_favorite(game.id) { '*' } else { ' ' };
        println!("{} {}", marker, summary(game));
    }

    if catalog.view() == View::All {
        println!(
            "-- page {} ({} shown, {} in catalog)",
            catalog.page(),
            games.len(),
            catalog.total()
        );
    }
}

fn print_details(details: &GameDetails) {
    let game = &details.game;
    println!("{}", summary(game));

    if !game.genres.is_empty() {
        println!("Genres: {}", game.genre_names().join(", "));
    }
    if !game.platforms.is_empty() {
        println!("Platforms: {}", game.platform_names().join(", "));
    }
    if let Some(description) = &game.description_raw {
        println!("\n{}", description.trim());
    }
    for image in &details.screenshots {
        println!("Screenshot: {}", image);
    }
}

fn print_named(title: &str, list: Result<Vec<NamedRef>, LibraryError>) {
    match list {
        Ok(items) => {
            println!("{}:", title);
            for item in items {
                println!("  {}", item.name);
            }
        }
        Err(e) => error!("Failed to load {}: {}", title.to_lowercase(), e),
    }
}

fn summary(game: &Game) -> String {
    let mut line = format!("[{}] {}", game.id, game.name);
    if let Some(released) = &game.released {
        line.push_str(&format!(" ({})", released));
    }
    if let Some(rating) = game.rating {
        line.push_str(&format!(" - {:.1}", rating));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("gamedex-browser").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.config, PathBuf::from("gamedex.toml"));
        assert_eq!(args.page, 1);
        assert!(!args.favorites);
        assert_eq!(args.game, None);
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&["--config", "/tmp/g.toml", "--page", "3", "--favorites"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/tmp/g.toml"));
        assert_eq!(args.page, 3);
        assert!(args.favorites);

        let args = parse(&["--genres", "--platforms"]).unwrap();
        assert!(args.genres && args.platforms);
    }

    #[test]
    fn test_game_id_classified() {
        let args = parse(&["--game", "42"]).unwrap();
        assert_eq!(args.game.map(GameId::from_raw), Some(GameId::Remote(42)));

        let args = parse(&["--game", "-1700000000000"]).unwrap();
        assert_eq!(
            args.game.map(GameId::from_raw),
            Some(GameId::Local(-1_700_000_000_000))
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(parse(&["--page"]).is_err());
        assert!(parse(&["--page", "zero"]).is_err());
        assert!(parse(&["--page", "0"]).is_err());
        assert!(parse(&["--game", "abc"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_summary() {
        let mut game = Game::new(GameId::Remote(3), "Portal");
        assert_eq!(summary(&game), "[3] Portal");

        game.released = Some("2007-10-09".into());
        game.rating = Some(4.51);
        assert_eq!(summary(&game), "[3] Portal (2007-10-09) - 4.5");
    }
}
