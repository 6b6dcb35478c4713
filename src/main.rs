use clap::Parser;
use weatherai_core::{AppError, Config};
use weatherai_weather::{CityWeather, LoadOutcome, ResponseCache, WeatherService};

/// Look up current conditions and the forecast for a city.
#[derive(Debug, Parser)]
#[command(name = "weatherai", version, about)]
struct Cli {
    /// City to look up (defaults to `weather.default_city`)
    city: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("weatherai failed: {}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    // Initialize core
    weatherai_core::init()?;

    let (config, _) = Config::load_validated()?;
    tracing::debug!("Config directory: {}", config.config_dir.display());

    let cache = ResponseCache::in_dir(&config.config_dir);
    let service = WeatherService::from_config(&config.weather, cache)?;

    match service.load_city(cli.city.as_deref().unwrap_or_default()).await? {
        LoadOutcome::Loaded(weather) => print_weather(&weather),
        // Only one load per run, so nothing can supersede it
        LoadOutcome::Superseded => tracing::debug!("Weather load superseded"),
    }

    Ok(())
}

fn print_weather(weather: &CityWeather) {
    println!("{}", weather.heading());
    if let Some(location) = &weather.location {
        println!("  {} ({})", location.full_name, location.coordinates);
    }

    if let Some(current) = &weather.current {
        println!();
        println!("Now: {}", current.condition);
        println!(
            "  Temperature: {}°C (feels like {}°C)",
            show(current.temperature),
            show(current.apparent_temperature)
        );
        println!(
            "  Humidity: {}%  Wind: {} m/s",
            show(current.humidity),
            show(current.wind_speed)
        );
        println!("  Pressure: {} hPa", show(current.pressure));
        if let Some(uv) = current.uv_index {
            println!("  UV index: {}", uv);
        }
        if let Some(visibility) = current.visibility {
            println!("  Visibility: {} km", visibility);
        }
    }

    println!();
    println!(
        "Sunrise {}  Sunset {}",
        weather.sun_times.sunrise, weather.sun_times.sunset
    );

    if !weather.hourly.is_empty() {
        println!();
        println!("Next 24 hours:");
        for hour in &weather.hourly {
            println!(
                "  {:>8}  {:>4}°C  {:<14} rain {}%",
                hour.time,
                show(hour.temperature),
                hour.condition.to_string(),
                show(hour.precipitation_chance)
            );
        }
    }

    if !weather.daily.is_empty() {
        println!();
        println!("Coming days:");
        for day in &weather.daily {
            println!(
                "  {:<9} {:<12} {:>4}°C  {:<14} rain {}%",
                day.day,
                day.date,
                show(day.temperature_avg),
                day.condition.to_string(),
                day.precipitation_chance
            );
        }
    }

    if let Some(insight) = &weather.insight {
        println!();
        println!("{}", insight);
    }
}

fn show(value: Option<i64>) -> String {
    value.map_or_else(|| weatherai_weather::time::NOT_AVAILABLE.to_string(), |v| v.to_string())
}
