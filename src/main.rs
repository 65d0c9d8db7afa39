use anyhow::{Context, Result};
use aqaar_listings::{Config, FetchMode, Language, PropertyFilters, Store};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Aqaar Listings");
    info!("=================");

    let config = Config::from_env().context("Failed to load configuration")?;
    let language: Language = std::env::var("AQAAR_LANG")
        .ok()
        .map(|code| code.parse::<Language>())
        .transpose()
        .context("AQAAR_LANG must be 'ar' or 'en'")?
        .unwrap_or_default();
    let mode = match std::env::var("AQAAR_FETCH_MODE").as_deref() {
        Ok("server") => FetchMode::ServerFiltered,
        _ => FetchMode::ClientFiltered,
    };

    // Filters come in as the JSON the filter form produces, e.g. '{"minPrice": 500000}'
    let filters: PropertyFilters = match std::env::args().nth(1) {
        Some(raw) => serde_json::from_str(&raw).context("Filters must be a JSON object")?,
        None => PropertyFilters::default(),
    };

    info!(base_url = %config.base_url, %language, ?mode, "Connecting");
    let store = Store::init(config, language).context("Failed to create store")?;

    store.preload_critical().await;

    let mut session = store.listing_session_with_mode(mode, filters);
    session
        .fetch_all()
        .await
        .context("Failed to fetch property listings")?;

    let Some(view) = session.visible() else {
        warn!("Listing endpoint returned no pages");
        store.teardown();
        return Ok(());
    };

    info!(
        "✅ {} of {} properties match ({} active filters)",
        view.content.len(),
        session.properties().len(),
        session.filters().active_count()
    );

    for (i, property) in view.content.iter().enumerate() {
        let labels = store.labels_for(property);
        println!("{}. {} ({} SAR)", i + 1, property.title, property.price);
        println!(
            "   {} · {} · {}",
            labels.listing_type, labels.property_type, labels.city
        );
        println!(
            "   {} rooms, {} baths, {} m²",
            property.rooms_count, property.bathrooms_count, property.area
        );
        if !labels.region.is_empty() {
            println!("   Region: {}", labels.region);
        }
        if !labels.features.is_empty() {
            println!("   Features: {}", labels.features.join(", "));
        }
        println!("   ID: {}", property.id);
        println!();
    }

    let json = serde_json::to_string_pretty(&view.content)?;
    tokio::fs::write("filtered_properties.json", json).await?;
    info!("💾 Saved {} properties to filtered_properties.json", view.content.len());

    store.teardown();
    Ok(())
}
