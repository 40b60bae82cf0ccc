//! `routing.optimize` message handler

use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};

use crate::auth::extract_auth;
use crate::services::optimization::OptimizationCoordinator;
use crate::types::{ErrorResponse, OptimizeRequest, Request, SuccessResponse};

/// Handles `routing.optimize`: dispatches to the coordinator per `mode`.
pub async fn handle_optimize(
    client: Client,
    mut subscriber: Subscriber,
    coordinator: std::sync::Arc<OptimizationCoordinator>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.optimize message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("routing.optimize message without reply subject");
                continue;
            }
        };

        let request: Request<OptimizeRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse optimize request: {}", e);
                let error = ErrorResponse::new(uuid::Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let auth = match extract_auth(&request, &jwt_secret) {
            Ok(auth) => auth,
            Err(e) => {
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match coordinator.optimize(auth.tenant_id, &request.payload).await {
            Ok(result) => {
                let response = SuccessResponse::new(request.id, result);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("optimize failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}
