//! mapyou command-line entry point.
//!
//! Resolves the initial center, syncs the markers around it once and prints
//! them. With `SELECT_EVENT_ID` set, also selects that event and prints its
//! detail and reviews.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;

use mapyou_client::MapSession;
use mapyou_client::api::{EventsApi, HttpEventsApi};
use mapyou_client::config::ClientConfig;
use mapyou_client::domain::{EventId, GeoPoint, MapEvent, ViewportBounds, next_matching};
use mapyou_client::service::{FixedLocation, LocationProvider, NoLocationService};

/// Height and width of the first viewport, in degrees.
const INITIAL_SPAN: f64 = 0.05;

/// Longest wait for the first bounds query to settle.
const SYNC_WAIT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(ClientConfig::from_env()?);
    tracing::info!(api = %config.api_base_url, "starting mapyou");

    let api = Arc::new(HttpEventsApi::new(&config)?);
    match device_location()? {
        Some(point) => run(api, Arc::new(FixedLocation(point)), config).await,
        None => run(api, Arc::new(NoLocationService), config).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Reads the device position from `DEVICE_LAT` and `DEVICE_LNG`.
fn device_location() -> anyhow::Result<Option<GeoPoint>> {
    let (Ok(lat), Ok(lng)) = (std::env::var("DEVICE_LAT"), std::env::var("DEVICE_LNG")) else {
        return Ok(None);
    };
    let lat = lat.trim().parse().context("DEVICE_LAT is not a number")?;
    let lng = lng.trim().parse().context("DEVICE_LNG is not a number")?;
    Ok(Some(GeoPoint::new(lat, lng)))
}

async fn run<A: EventsApi, L: LocationProvider>(
    api: Arc<A>,
    location: Arc<L>,
    config: Arc<ClientConfig>,
) -> anyhow::Result<()> {
    let period = config.default_period;
    let session = MapSession::new(api, location, config);
    let mut rx = session.subscribe();

    let center = session.resolve_initial_center().await;
    let Some(bounds) = ViewportBounds::around(center, INITIAL_SPAN, INITIAL_SPAN) else {
        bail!("cannot build a viewport around {center}");
    };
    session.on_viewport_settled(bounds, period);

    let settled = tokio::time::timeout(
        SYNC_WAIT,
        next_matching(&mut rx, |e| {
            matches!(e, MapEvent::EventsReplaced { .. } | MapEvent::SyncFailed { .. })
        }),
    )
    .await
    .context("bounds query did not settle in time")?;

    if let Some(MapEvent::SyncFailed { reason, .. }) = settled {
        bail!("loading events failed: {reason}");
    }

    let markers = session.markers();
    println!("{} events in {bounds} ({period})", markers.len());
    for marker in &markers {
        println!("  {:<10} {:<12} {}", marker.id, marker.icon.label, marker.position);
    }
    if let Some(me) = session.user_location() {
        println!("  you are at {me}");
    }

    if let Ok(raw) = std::env::var("SELECT_EVENT_ID") {
        show_event(&session, &parse_event_id(&raw)).await?;
    }
    Ok(())
}

fn parse_event_id(raw: &str) -> EventId {
    let raw = raw.trim();
    raw.parse::<i64>()
        .map_or_else(|_| EventId::from(raw), EventId::from)
}

async fn show_event<A: EventsApi, L: LocationProvider>(
    session: &MapSession<A, L>,
    id: &EventId,
) -> anyhow::Result<()> {
    let Some(detail) = session.select_event(id).await else {
        bail!("could not load event {id}");
    };

    println!();
    println!("{}", detail.title);
    if let Some(category) = &detail.category {
        println!("  category: {category}");
    }
    if let Some((start, end)) = detail.schedule() {
        println!("  dates:    {start} .. {end}");
    }
    if let Some(location) = &detail.location {
        println!("  where:    {location}");
    }
    if let Some(url) = &detail.site_url {
        println!("  site:     {url}");
    }

    let reviews = session.reviews().reviews();
    println!("  {} reviews", reviews.len());
    for review in &reviews {
        println!(
            "    {} {}: {}",
            review.rating.stars(),
            review.author(),
            review.comment
        );
    }
    Ok(())
}
