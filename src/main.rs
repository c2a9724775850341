mod config;
mod database;
mod engine;
mod entities;
mod http_server;
mod logging;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::Serialize;

use crate::{
    config::Config,
    database::Database,
    engine::{Locale, PageSize},
    http_server::app::HttpServerConfig,
    http_server::graphql::query_builder::{
        RankFilter, RatedFilter, SortInput, SortOrder, TrackFilters, TrackSortField,
    },
    logging::setup_logging,
    ports::rating_store::TrackListQuery,
    services::{
        catalog::CatalogService, insights::InsightsService, rating::RatingService,
        store::SeaOrmRatingStore,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "TRACK_RATER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "TRACK_RATER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads ratings.
#[derive(clap::Args, Debug)]
struct Audience {
    /// User to act for (default: `user_id` from the config)
    #[arg(short, long)]
    user: Option<i64>,

    /// Display locale, "en" or "ja" (default: `locale` from the config)
    #[arg(short, long)]
    locale: Option<String>,
}

impl Audience {
    fn resolve(&self, config: &Config) -> (i64, Locale) {
        (
            self.user.unwrap_or(config.user_id),
            self.locale
                .as_deref()
                .map(Locale::from_code)
                .unwrap_or(config.locale),
        )
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the GraphQL API
    Serve {
        /// The port to run the server on
        #[arg(short, long, default_value = "3000", env = "TRACK_RATER_HTTP_PORT")]
        port: u16,
    },
    /// Print rating statistics and favorite producers/voicebanks as JSON
    Stats {
        #[command(flatten)]
        audience: Audience,
    },
    /// Print recommended unrated tracks as JSON
    Recommend {
        #[command(flatten)]
        audience: Audience,

        /// Maximum number of tracks (default: `recommendation_limit` from the config)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Rate a track, replacing an earlier rating
    Rate {
        track_id: i64,
        rating: f64,

        #[arg(long)]
        notes: Option<String>,

        #[arg(short, long)]
        user: Option<i64>,
    },
    /// Delete a rating
    Unrate {
        track_id: i64,

        #[arg(short, long)]
        user: Option<i64>,
    },
    /// Print the page of every track in a listing as JSON
    Snapshot {
        #[command(flatten)]
        audience: Audience,

        #[arg(long, value_enum, default_value_t = RankFilter::Ranked)]
        rank: RankFilter,

        #[arg(long, value_enum)]
        rated: Option<RatedFilter>,

        /// Only tracks rated exactly this value
        #[arg(long)]
        rating: Option<f64>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        producer: Option<String>,

        #[arg(long)]
        voicebank: Option<String>,

        #[arg(long, value_enum)]
        sort: Option<TrackSortField>,

        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,

        /// Tracks per page, or "all" (default: `page_size` from the config)
        #[arg(long)]
        page_size: Option<PageSize>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[derive(Serialize)]
struct RecommendationRow {
    track_id: i64,
    title: String,
    score: f64,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).wrap_err("Failed to serialize output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Track rater starting");

    let command = match args.command {
        Commands::Config(config_commands) => {
            match config_commands {
                ConfigCommands::CreateDefault => {
                    log::debug!("Creating default config");
                    let path = match args.config {
                        Some(path) => {
                            Config::write_default(&path)?;
                            path
                        }
                        None => Config::create_default()?,
                    };
                    println!("{}", path.display());
                }
                ConfigCommands::Path => match args.config.or_else(Config::config_path) {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No default config path found"),
                },
            }
            return Ok(());
        }
        command => command,
    };

    log::debug!("Loading configuration");
    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .wrap_err("Failed to load track-rater config")?;

    let database = Database::open(&config.database_path()).await?;

    match command {
        Commands::Serve { port } => {
            log::info!("Starting HTTP server on port: {}", port);
            http_server::app::start(HttpServerConfig {
                port,
                database,
                config,
            })
            .await?;
        }
        Commands::Stats { audience } => {
            let (user_id, locale) = audience.resolve(&config);
            let insights = InsightsService::new(SeaOrmRatingStore::new(Arc::new(database)));
            print_json(&insights.statistics(user_id, locale).await?)?;
        }
        Commands::Recommend { audience, limit } => {
            let (user_id, locale) = audience.resolve(&config);
            let limit = match limit {
                None => config.recommendation_limit,
                Some(limit) => engine::recommender::checked_limit(limit)
                    .ok_or_else(|| eyre!("limit must be positive, got {}", limit))?,
            };
            let db = Arc::new(database);

            let insights = InsightsService::new(SeaOrmRatingStore::new(db.clone()));
            let candidates = insights.recommendations(user_id, locale, limit).await?;

            let ids: Vec<i64> = candidates.iter().map(|c| c.track_id).collect();
            let tracks = CatalogService::new(db).get_tracks(&ids).await?;
            let rows: Vec<RecommendationRow> = candidates
                .iter()
                .filter_map(|candidate| {
                    let track = tracks.iter().find(|t| t.id == candidate.track_id)?;
                    Some(RecommendationRow {
                        track_id: candidate.track_id,
                        title: locale
                            .pick(&track.title, track.title_jp.as_deref())
                            .to_string(),
                        score: engine::round2(candidate.score),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        Commands::Rate {
            track_id,
            rating,
            notes,
            user,
        } => {
            let user_id = user.unwrap_or(config.user_id);
            let service = RatingService::new(Arc::new(database));
            let saved = service.rate(user_id, track_id, rating, notes).await?;
            log::info!("Rated track {} as {}", saved.track_id, saved.rating);
            println!("{} -> {}", saved.track_id, saved.rating);
        }
        Commands::Unrate { track_id, user } => {
            let user_id = user.unwrap_or(config.user_id);
            let service = RatingService::new(Arc::new(database));
            if service.delete(user_id, track_id).await? {
                println!("Deleted rating for track {}", track_id);
            } else {
                println!("Track {} was not rated", track_id);
            }
        }
        Commands::Snapshot {
            audience,
            rank,
            rated,
            rating,
            title,
            producer,
            voicebank,
            sort,
            order,
            page_size,
        } => {
            let (user_id, locale) = audience.resolve(&config);
            let query = TrackListQuery {
                user_id,
                filters: TrackFilters {
                    rank,
                    rated,
                    exact_rating: rating,
                    title,
                    producer,
                    voicebank,
                },
                sort: sort
                    .map(|field| vec![SortInput { field, order }])
                    .unwrap_or_default(),
                locale,
            };
            let insights = InsightsService::new(SeaOrmRatingStore::new(Arc::new(database)));
            let entries = insights
                .snapshot(&query, page_size.unwrap_or(config.page_size))
                .await?;
            print_json(&entries)?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
