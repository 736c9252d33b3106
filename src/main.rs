use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use skycast_core::config::Config;
use skycast_search::{
    FetchState, JsonFileHistoryStore, SearchError, SearchOrchestrator, DEFAULT_CITIES,
};
use skycast_weather::{CityLookup, FetchGateway, OpenWeatherClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    skycast_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Skycast started, config dir: {}", config.config_dir.display());

    let client = OpenWeatherClient::new(
        &config.weather.api_key,
        config.weather.units,
        Duration::from_secs(config.weather.timeout_secs),
    )?;
    let gateway = FetchGateway::new(client);
    let store = Arc::new(JsonFileHistoryStore::new(&config.config_dir));
    let orchestrator = SearchOrchestrator::new(gateway, store).await;

    println!("Skycast - weather by city");
    println!("Type a city name to search, or :help for commands.");
    print_suggestions(&orchestrator);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            ":quit" | ":q" => break,
            ":help" => print_help(),
            ":history" => print_suggestions(&orchestrator),
            ":clear" => {
                orchestrator.clear_result();
                println!("Result cleared.");
            }
            ":clear-history" => {
                orchestrator.clear_history().await;
                println!("History cleared.");
            }
            ":refresh" => {
                orchestrator.refresh().await;
                print_state(&orchestrator.state(), &config);
            }
            query => match orchestrator.submit(query).await {
                Ok(()) => print_state(&orchestrator.state(), &config),
                Err(SearchError::EmptyQuery) => {
                    println!("Please enter a city name.");
                }
            },
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <city>          search weather for a city");
    println!("  :history        show recent searches");
    println!("  :refresh        re-fetch the current city");
    println!("  :clear          clear the current result");
    println!("  :clear-history  forget recent searches");
    println!("  :quit           exit");
}

fn print_suggestions<C: CityLookup>(orchestrator: &SearchOrchestrator<C>) {
    let history = orchestrator.history();
    if history.is_empty() {
        println!("Popular cities: {}", DEFAULT_CITIES.join(", "));
    } else {
        println!("Recent searches: {}", history.join(", "));
    }
}

fn print_state(state: &FetchState, config: &Config) {
    match state {
        FetchState::Idle => println!("Nothing to show yet."),
        FetchState::Loading { city } => println!("Fetching weather for {}...", city),
        FetchState::Success { report, .. } => {
            let suffix = config.weather.units.temperature_suffix();
            let country = report
                .sun
                .country
                .as_deref()
                .map(|c| format!(", {}", c))
                .unwrap_or_default();
            println!("{}{}: {}", report.name, country, report.condition().description());
            println!(
                "  {:.1}{} (feels like {:.1}{})",
                report.main.temp, suffix, report.main.feels_like, suffix
            );
            println!(
                "  humidity {}%, wind {:.1} m/s",
                report.main.humidity, report.wind.speed
            );
        }
        FetchState::Failed { message, .. } => {
            println!("{}", message);
            println!("Check the city name, or :refresh to retry.");
        }
    }
}
