//! `routing.temp_assignment.set` message handler

use std::sync::Arc;

use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth::extract_auth;
use crate::services::temp_assignment::TempAssignmentService;
use crate::types::{ErrorResponse, Request, SetTempAssignmentRequest, SuccessResponse};

/// Handles `routing.temp_assignment.set`: creates or replaces a day-scoped
/// reassignment and returns the affected techs' regenerated routes.
pub async fn handle_set(
    client: Client,
    mut subscriber: Subscriber,
    temp_assignment: Arc<TempAssignmentService>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.temp_assignment.set message");
        let Some(reply) = msg.reply.clone() else {
            warn!("routing.temp_assignment.set message without reply subject");
            continue;
        };

        let request: Request<SetTempAssignmentRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
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

        let payload = &request.payload;
        let result = temp_assignment
            .set_temp_assignment(
                auth.tenant_id,
                payload.customer_id,
                payload.tech_id,
                &payload.service_day,
                payload.assignment_date,
            )
            .await;
        match result {
            Ok(routes) => {
                let response = SuccessResponse::new(request.id, routes);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("set_temp_assignment failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }
    Ok(())
}
