use cbview::prelude::*;
use cbview::{Endpoint, Signature};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod widgets;

use widgets::{WidgetRepository, WidgetView};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received SIGTERM signal"),
    }
}

fn routes() -> cbview::Result<RouteTable> {
    let mut views = RouteTable::new();
    views.get(
        "/health",
        Endpoint::function("health", Signature::empty(), |_| async { "ok" }),
    );
    WidgetView::register_routes(&mut views);
    cbv(&mut views).view::<WidgetView>()?;
    Ok(views)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cbview=debug,tower_http=debug")),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(database_url = %settings.database_url, "Starting widget server");

    let container = ContainerBuilder::new()
        .register(WidgetRepository::default())
        .build();

    let mut web = RouteTable::new();
    web.nest(&settings.api_prefix, routes()?);
    let mut table = RouteTable::new();
    table.include_tagged(web, ["Widgets"]);

    let app = table
        .into_router()?
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(container));

    let listener = tokio::net::TcpListener::bind(settings.addr()).await?;
    tracing::info!("Server running on http://{}{}", settings.addr(), settings.api_prefix);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
