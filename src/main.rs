use mindgraph_backend::client::GraphClient;
use mindgraph_backend::config::Config;
use mindgraph_backend::logging;
use mindgraph_backend::state::AppState;
use mindgraph_backend::store::{GraphStore, PrefsStore};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config);

    let mut graph = match GraphStore::load_or_create(&config.graph_path) {
        Ok(store) => store,
        Err(err) => {
            // State unknown is not an empty graph; refuse to start over it.
            tracing::error!(error = %err, path = %config.graph_path.display(), "failed to load graph");
            std::process::exit(1);
        }
    };

    if let Some(base_url) = &config.remote_base_url {
        match fetch_remote_graph(base_url, config.request_timeout_ms).await {
            Ok(snapshot) => {
                let store = GraphStore::from_snapshot(snapshot, Some(config.graph_path.clone()));
                if let Err(err) = store.persist() {
                    tracing::warn!(error = %err, "failed to persist synced graph");
                }
                tracing::info!(topics = store.metadata().total_topics, "synced graph from remote");
                graph = store;
            }
            // A failed fetch means state unknown; the local copy stands.
            Err(err) => tracing::warn!(error = %err, "remote graph sync failed, keeping local state"),
        }
    }

    let prefs = match PrefsStore::open(&config.prefs_path) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, path = %config.prefs_path.display(), "failed to load preferences");
            std::process::exit(1);
        }
    };

    let state = AppState::new(graph, prefs);
    let app = mindgraph_backend::create_app(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "mindgraph backend listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
    }

    tracing::info!("graceful shutdown complete");
}

async fn fetch_remote_graph(
    base_url: &str,
    timeout_ms: u64,
) -> Result<mindgraph_backend::store::KnowledgeGraph, mindgraph_backend::store::GraphError> {
    let client = GraphClient::new(base_url, timeout_ms)?;
    client.fetch_graph().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
