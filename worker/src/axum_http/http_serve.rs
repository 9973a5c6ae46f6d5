use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use backend::usecases::lifecycle::LifecycleUseCase;
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad,
    repositories::{
        coach_profiles::CoachProfilePostgres, coach_subscriptions::CoachSubscriptionPostgres,
        plans::PlanCatalogPostgres, student_subscriptions::StudentSubscriptionPostgres,
    },
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let coach_subscription_repo =
        Arc::new(CoachSubscriptionPostgres::new(Arc::clone(&db_pool)));
    let student_subscription_repo =
        Arc::new(StudentSubscriptionPostgres::new(Arc::clone(&db_pool)));
    let profile_repo = Arc::new(CoachProfilePostgres::new(Arc::clone(&db_pool)));
    let plan_repo = Arc::new(PlanCatalogPostgres::new(Arc::clone(&db_pool)));

    let lifecycle_usecase = Arc::new(LifecycleUseCase::new(
        coach_subscription_repo,
        student_subscription_repo,
        profile_repo,
        plan_repo,
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/internal/v1/sweep",
            routers::sweep_subscriptions::routes(Arc::clone(&config), lifecycle_usecase),
        )
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.worker_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.worker_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Worker HTTP server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM signal handler");
        sigterm.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
