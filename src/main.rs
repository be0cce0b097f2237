use adaptive_learning_backend::config::Config;
use adaptive_learning_backend::logging;
use adaptive_learning_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config);

    let state = AppState::from_env(config.llm_enabled, config.llm_mock);
    if !config.llm_enabled {
        tracing::warn!("LLM_ENABLED=false; preference classification requests will be refused");
    } else if !state.classifier().is_available() {
        tracing::warn!("LLM credentials missing; preference classification will fail until LLM_API_KEY is set");
    }

    let app = adaptive_learning_backend::build_app(state);

    let addr = config.bind_addr();
    tracing::info!(
        %addr,
        llm_enabled = config.llm_enabled,
        llm_mock = config.llm_mock,
        "adaptive-learning-backend listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
