use anyhow::{Context, Result};
use nearby_core::{AppError, Config, Coordinates, TemperatureUnit, ViewportBounds};
use nearby_geo::{ConfiguredLocation, GeocodeClient};
use nearby_places::{Category, PlacesClient};
use nearby_state::{GeolocationBootstrap, PlacesSource, Session, WeatherSource};
use nearby_weather::WeatherProvider;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: category <restaurants|hotels|attractions>, rating <value>, \
select <n>, clear, search <query>, pan <dlat> <dlng>, refresh, show, quit";

/// Stand-in for the map surface: owns the viewport and re-reports it.
struct Viewport {
    span: f64,
    bounds: Option<ViewportBounds>,
}

impl Viewport {
    fn recenter(&mut self, center: Coordinates) -> ViewportBounds {
        let bounds = ViewportBounds::around(center, self.span);
        self.bounds = Some(bounds);
        bounds
    }

    fn pan(&mut self, dlat: f64, dlng: f64) -> Option<ViewportBounds> {
        let center = self.bounds?.center().offset(dlat, dlng);
        Some(self.recenter(center))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    nearby_core::init()?;

    let (config, _) = Config::load_validated()?;
    let timeout = config.http.timeout();

    let places = PlacesClient::new(&config.places, timeout).map_err(|e| explain(e.into()))?;
    let weather = WeatherProvider::new(&config.weather, timeout).map_err(|e| explain(e.into()))?;
    let unit = weather.unit();
    let geocoder = GeocodeClient::new(&config.geocoding, timeout)
        .context("Failed to create geocoding client")?;
    let location = ConfiguredLocation::from_config(&config.location, timeout);

    let category = config
        .search
        .default_category
        .parse::<Category>()
        .unwrap_or_else(|e| {
            tracing::warn!("{}; falling back to {}", e, Category::default());
            Category::default()
        });

    let mut session = Session::new(places, weather, category);
    let mut viewport = Viewport {
        span: config.search.viewport_span_degrees,
        bounds: None,
    };

    tracing::info!("Nearby started");

    match session.bootstrap(GeolocationBootstrap::new(location)).await {
        Ok(_) => recenter(&mut session, &mut viewport, &geocoder).await,
        Err(e) => println!("{}", AppError::from(e).user_message()),
    }
    session.settle().await;
    report(&mut session, unit);

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "show" => {
                session.apply_ready();
            }
            "category" => match arg.parse::<Category>() {
                Ok(category) => session.set_category(category),
                Err(e) => println!("{}", e),
            },
            "rating" => session.set_rating_threshold(arg),
            "select" => match arg.parse::<usize>() {
                Ok(n) if n >= 1 => {
                    if let Err(e) = session.set_highlighted_index(Some(n - 1)) {
                        println!("{}", e);
                    }
                }
                _ => println!("usage: select <n> (1-based)"),
            },
            "clear" => {
                // A cleared highlight cannot be out of range.
                let _ = session.set_highlighted_index(None);
            }
            "search" => match geocoder.search(arg).await {
                Ok(suggestions) => match suggestions.first() {
                    Some(first) => {
                        for s in &suggestions {
                            println!("  {}", s.label);
                        }
                        session.select_place(first);
                        recenter(&mut session, &mut viewport, &geocoder).await;
                    }
                    None => println!("No matches for '{}'", arg),
                },
                Err(e) => println!("Search failed: {}", e),
            },
            "pan" => {
                let mut parts = arg.split_whitespace().map(str::parse::<f64>);
                match (parts.next(), parts.next()) {
                    (Some(Ok(dlat)), Some(Ok(dlng))) => match viewport.pan(dlat, dlng) {
                        Some(bounds) => session.set_bounds(Some(bounds)),
                        None => println!("No viewport yet"),
                    },
                    _ => println!("usage: pan <dlat> <dlng>"),
                }
            }
            "refresh" => session.refresh(),
            other => {
                println!("Unknown command '{}'", other);
                continue;
            }
        }

        if session.store().is_loading() {
            println!("loading...");
        }
        session.settle().await;
        report(&mut session, unit);
    }

    tracing::info!("Nearby stopped");
    Ok(())
}

/// Recenter the viewport on the session's coordinates, like the map does on a
/// coordinate change, and report the new bounds.
async fn recenter<P: PlacesSource, W: WeatherSource>(
    session: &mut Session<P, W>,
    viewport: &mut Viewport,
    geocoder: &GeocodeClient,
) {
    let Some(coords) = session.store().coordinates() else {
        return;
    };
    let bounds = viewport.recenter(coords);
    session.set_bounds(Some(bounds));

    match geocoder.reverse(coords).await {
        Some(label) => println!("Near {}", label),
        None => println!("Near {}", coords),
    }
}

/// Print the user-facing message for `err` and hand it back for propagation.
fn explain(err: AppError) -> AppError {
    eprintln!("{}", err.user_message());
    err
}

fn report<P: PlacesSource, W: WeatherSource>(session: &mut Session<P, W>, unit: TemperatureUnit) {
    for notice in session.take_notices() {
        println!("! {}", notice);
    }
    let store = session.store();

    println!();
    println!(
        "[{}] rating > {} | loading: {}",
        store.category(),
        if store.rating_threshold().is_empty() {
            "any"
        } else {
            store.rating_threshold().as_str()
        },
        store.is_loading()
    );

    if let Some(snapshot) = store.weather() {
        let symbol = match unit {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        };
        println!(
            "Weather: {:.0}{} (feels {:.0}{}), {}, humidity {}%",
            snapshot.current.temperature,
            symbol,
            snapshot.current.feels_like,
            symbol,
            snapshot.current.condition.description(),
            snapshot.current.humidity
        );
    }

    let displayed = store.displayed_results();
    if displayed.is_empty() {
        println!("No places to show.");
    }
    for (i, place) in displayed.iter().enumerate() {
        let marker = if store.is_highlighted(i) { '>' } else { ' ' };
        let rating = place
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {:>2}. {} ({}, {} reviews)",
            marker,
            i + 1,
            place.name,
            rating,
            place.num_reviews
        );
    }
}
