use cil_routes::display::{format_duration, schedule_caption};
use cil_routes::{
    ReqwestHttpClient, RouteFilter, RouteListController, RuntimeConfig, SupabaseRouteGateway,
    classify,
};
use cil_shared::date::{Clock, SystemClock};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ENV_ACCESS_TOKEN: &str = "CIL_ACCESS_TOKEN";

/// Prints the route list for each filter given on the command line
/// (all three when none are given).
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let filters = std::env::args()
        .skip(1)
        .map(|arg| arg.parse::<RouteFilter>())
        .collect::<Result<Vec<_>, _>>()?;
    let filters = if filters.is_empty() {
        RouteFilter::VARIANTS.to_vec()
    } else {
        filters
    };

    let config = RuntimeConfig::from_env()?;
    let mut gateway = SupabaseRouteGateway::new(ReqwestHttpClient::new(), &config);
    if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
        gateway = gateway.with_access_token(token);
    }

    let controller = RouteListController::builder(Arc::new(gateway))
        .fetch_timeout(config.fetch_timeout)
        .build();

    for filter in filters {
        controller.set_filter(filter).await?;
        let state = controller.snapshot();
        let today = SystemClock.today();

        println!("== {} ({} routes)", filter, state.routes.len());
        if let Some(error) = &state.error {
            println!("   ! {}", error);
        }
        for route in &state.routes {
            let badge = classify(route, today).badge();
            let duration = route
                .estimated_duration_minutes
                .map(format_duration)
                .unwrap_or_default();
            println!(
                "   {:<10} [{}] {} | {} {}",
                route.route_number,
                badge.label,
                route.name,
                route.frequency_type.label(),
                duration
            );
            if let Some(caption) = schedule_caption(route, today) {
                println!("              {}", caption);
            }
        }
    }

    Ok(())
}
