//! NATS message handlers

pub mod optimize;
pub mod ping;
pub mod routes;
pub mod temp_assignment;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::services::materializer::DailyRouteMaterializer;
use crate::services::matrix::MatrixProvider;
use crate::services::optimization::OptimizationCoordinator;
use crate::services::persistence::RoutePersistence;
use crate::services::temp_assignment::TempAssignmentService;

/// Subscribes every `routing.*` subject and spawns its handler loop, one
/// `tokio::spawn`ed task per subject.
pub async fn start_handlers(
    nats_client: Client,
    pool: PgPool,
    matrix_provider: Arc<dyn MatrixProvider>,
    config: &Config,
) -> Result<()> {
    let persistence = Arc::new(RoutePersistence::new(pool.clone()));
    let optimization = Arc::new(OptimizationCoordinator::new(pool.clone(), matrix_provider));
    let materializer = Arc::new(DailyRouteMaterializer::new(pool.clone(), optimization.clone(), persistence.clone()));
    let temp_assignment = Arc::new(TempAssignmentService::new(pool.clone(), optimization.clone(), persistence.clone()));

    let jwt_secret = config.jwt_secret.clone();

    let ping_sub = nats_client.subscribe("ping").await?;
    tokio::spawn({
        let client = nats_client.clone();
        async move {
            if let Err(e) = ping::handle_ping(client, ping_sub).await {
                tracing::error!("ping handler exited: {}", e);
            }
        }
    });

    let optimize_sub = nats_client.subscribe("routing.optimize").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let coordinator = optimization.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = optimize::handle_optimize(client, optimize_sub, coordinator, secret).await {
                tracing::error!("routing.optimize handler exited: {}", e);
            }
        }
    });

    let save_sub = nats_client.subscribe("routing.routes.save").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let persistence = persistence.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = routes::handle_save(client, save_sub, persistence, secret).await {
                tracing::error!("routing.routes.save handler exited: {}", e);
            }
        }
    });

    let get_for_day_sub = nats_client.subscribe("routing.routes.get_for_day").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let materializer = materializer.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = routes::handle_get_for_day(client, get_for_day_sub, materializer, secret).await {
                tracing::error!("routing.routes.get_for_day handler exited: {}", e);
            }
        }
    });

    let reorder_sub = nats_client.subscribe("routing.routes.reorder_stops").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let persistence = persistence.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = routes::handle_reorder_stops(client, reorder_sub, persistence, secret).await {
                tracing::error!("routing.routes.reorder_stops handler exited: {}", e);
            }
        }
    });

    let move_stop_sub = nats_client.subscribe("routing.routes.move_stop").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let persistence = persistence.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = routes::handle_move_stop(client, move_stop_sub, persistence, secret).await {
                tracing::error!("routing.routes.move_stop handler exited: {}", e);
            }
        }
    });

    let delete_for_day_sub = nats_client.subscribe("routing.routes.delete_for_day").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let persistence = persistence.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = routes::handle_delete_for_day(client, delete_for_day_sub, persistence, secret).await {
                tracing::error!("routing.routes.delete_for_day handler exited: {}", e);
            }
        }
    });

    let temp_set_sub = nats_client.subscribe("routing.temp_assignment.set").await?;
    tokio::spawn({
        let client = nats_client.clone();
        let temp_assignment = temp_assignment.clone();
        let secret = jwt_secret.clone();
        async move {
            if let Err(e) = temp_assignment::handle_set(client, temp_set_sub, temp_assignment, secret).await {
                tracing::error!("routing.temp_assignment.set handler exited: {}", e);
            }
        }
    });

    info!("All routing.* handlers subscribed");

    // Block forever; the individual handler tasks run until their
    // subscriptions close or the process is terminated.
    std::future::pending::<()>().await;
    Ok(())
}
