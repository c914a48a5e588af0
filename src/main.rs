use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use travelrank::config::TravelRankConfig;
use travelrank::search::KakaoLocalClient;
use travelrank::{
    Category, CenterResolver, LocationInput, PipelineMode, RecommendationPipeline,
    RecommendationRequest, RecommendationResult, logging,
};

/// Weather-aware nearby place recommendations
#[derive(Parser)]
#[command(name = "travelrank")]
#[command(version)]
#[command(about = "Recommend nearby places, re-ranked for the current weather")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend places around a region or coordinates
    Recommend(RecommendArgs),
}

#[derive(clap::Args)]
struct RecommendArgs {
    /// Free text region, e.g. "Jongno-gu, Seoul"
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    region: Option<String>,

    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Comma separated categories (FOOD, CAFE, CULTURE, PHOTO, SHOPPING, HEALING, EXPERIENCE, STAY)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<Category>,

    /// raw (AI order as-is) or rebalanced (category-fair)
    #[arg(long)]
    mode: Option<PipelineMode>,

    /// Skip AI re-ranking
    #[arg(long)]
    no_ai: bool,

    /// Stop filling past top picks and category minimums at N places
    #[arg(long)]
    cap: Option<usize>,

    /// Search radius in meters
    #[arg(long)]
    radius: Option<u32>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TravelRankConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Recommend(args) => recommend(&config, args).await,
    }
}

async fn recommend(config: &TravelRankConfig, args: RecommendArgs) -> Result<()> {
    let kakao = KakaoLocalClient::new(&config.search)
        .map(Arc::new)
        .map_err(|e| anyhow::anyhow!("{}\n{e}", e.user_message()))?;
    let pipeline = RecommendationPipeline::from_config(config, kakao.clone())
        .map_err(|e| anyhow::anyhow!("{}\n{e}", e.user_message()))?;
    let resolver = CenterResolver::new(kakao, config.ranking.default_region.clone());
    let input = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => LocationInput::Coordinates(lat, lng),
        _ => LocationInput::Region(args.region.unwrap_or_default()),
    };
    let center = resolver
        .resolve(&input)
        .await
        .map_err(|e| anyhow::anyhow!("{}\n{e}", e.user_message()))?;

    let mut request = RecommendationRequest::new(center, args.categories, pipeline.ranking());
    if let Some(mode) = args.mode {
        request = request.with_mode(mode);
    }
    if args.no_ai {
        request = request.without_ai();
    }
    if let Some(cap) = args.cap {
        request.total_cap = Some(cap);
    }
    if let Some(radius) = args.radius {
        request.radius_meters = radius;
    }

    let result = pipeline.recommend(&request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&center.format_coordinates(), &result);
    }
    Ok(())
}

fn print_result(center: &str, result: &RecommendationResult) {
    println!("Recommendations around {center} ({} mode)", result.mode);
    if let Some(weather) = &result.weather {
        println!(
            "Weather: {} {}{}",
            weather.condition,
            weather.format_temperature(),
            if weather.is_adverse() { " (indoor preferred)" } else { "" }
        );
    }
    if !result.reranked {
        println!("AI re-ranking unavailable, showing distance order");
    }

    if result.places.is_empty() {
        println!("No places found.");
        return;
    }

    println!();
    for (i, place) in result.places.iter().enumerate() {
        let mut marks = String::new();
        if result.is_top_pick(&place.id) {
            marks.push_str(" [top pick]");
        }
        if result.ai_top_ids.contains(&place.id) {
            marks.push_str(" [AI pick]");
        }
        let distance = place
            .distance_meters
            .map(|d| format!(" - {d}m"))
            .unwrap_or_default();
        println!(
            "{:>2}. {} ({}){distance}{marks}",
            i + 1,
            place.name,
            place.category.label()
        );
        if let Some(reason) = result.reasons.get(&place.id) {
            println!("      {reason}");
        }
    }
}
