use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};

use daytrip::logging::LoggingSettings;
use daytrip::models::{PlaceCategory, Preferences, TravelMode};
use daytrip::{DayTripConfig, DayTripError, Recommendation, SessionState, TripRequest, setup, web};

/// Day-trip recommendations from a travel-time budget
#[derive(Parser)]
#[command(name = "daytrip")]
#[command(version)]
#[command(about = "Find places worth a day trip within your travel-time budget", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend destinations for one trip
    Recommend {
        /// Address, landmark or "lat,lon"
        #[arg(short, long)]
        origin: String,

        /// Total hours available for the day, travel included
        #[arg(long)]
        hours: f64,

        /// car, public, bus, train, bicycle or walking
        #[arg(short, long)]
        mode: Option<TravelMode>,

        /// Trip date (YYYY-MM-DD), departing at 09:00
        #[arg(long, conflicts_with = "departure")]
        date: Option<NaiveDate>,

        /// Departure time (YYYY-MM-DDTHH:MM); defaults to now
        #[arg(long)]
        departure: Option<String>,

        /// Free-text search keyword; wins over categories
        #[arg(long)]
        keyword: Option<String>,

        /// tourist-spot or culture-facility
        #[arg(long = "category")]
        categories: Vec<PlaceCategory>,

        #[arg(long = "like")]
        likes: Vec<String>,

        #[arg(long = "dislike")]
        dislikes: Vec<String>,

        #[arg(long = "must-include")]
        must_include: Vec<String>,

        #[arg(long = "must-avoid")]
        must_avoid: Vec<String>,

        /// Number of recommendations
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Serve the recommendation API over HTTP
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DayTripConfig::load_from_path(cli.config)?;

    let mut logging = LoggingSettings::from(&config.logging);
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    logging.init()?;

    let pipeline = setup::build_pipeline(&config)?;

    match cli.command {
        Commands::Recommend {
            origin,
            hours,
            mode,
            date,
            departure,
            keyword,
            categories,
            likes,
            dislikes,
            must_include,
            must_avoid,
            top_k,
        } => {
            let request = TripRequest {
                origin,
                departure: departure_time(date, departure.as_deref())?,
                max_travel_hours: hours,
                transportation: mode,
                categories,
                keyword,
                preferences: Preferences {
                    likes,
                    dislikes,
                    must_include,
                    must_avoid,
                },
                top_k,
            };

            match pipeline.run(&request).await {
                Ok(recommendation) => print_recommendation(request, recommendation),
                Err(e) => {
                    tracing::error!("Recommendation failed: {}", e);
                    eprintln!("❌ {}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
        Commands::Serve { port } => {
            web::run(Arc::new(pipeline), port).await?;
        }
    }

    Ok(())
}

fn departure_time(date: Option<NaiveDate>, departure: Option<&str>) -> Result<NaiveDateTime> {
    if let Some(departure) = departure {
        return NaiveDateTime::parse_from_str(departure, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(departure, "%Y-%m-%d %H:%M"))
            .map_err(|_| {
                DayTripError::validation(format!(
                    "Departure must look like 2026-10-18T09:00, got: {departure}"
                ))
            })
            .context("Invalid --departure");
    }

    Ok(match date {
        Some(date) => date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()),
        None => Local::now().naive_local(),
    })
}

fn print_recommendation(request: TripRequest, recommendation: Recommendation) {
    let origin = recommendation.origin;
    let mut session = SessionState::new(request);
    session.replace_candidates(recommendation.candidates);

    if session.remaining() == 0 {
        println!(
            "No destinations found within {:.1}h of {}.",
            session.request.max_travel_hours, origin
        );
        return;
    }

    println!(
        "🧭 {} destination(s) for {} on {}:\n",
        session.remaining(),
        session.request.origin,
        session.request.departure.date()
    );
    let mut position = 1;
    while let Some(candidate) = session.next_candidate() {
        println!(
            "{position}. {:.1} km away",
            origin.distance_km(&candidate.place.location)
        );
        println!("{candidate}");
        position += 1;
    }
}
