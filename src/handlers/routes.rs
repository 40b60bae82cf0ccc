//! `routing.routes.*` message handlers

use std::sync::Arc;

use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth::extract_auth;
use crate::services::materializer::DailyRouteMaterializer;
use crate::services::persistence::RoutePersistence;
use crate::types::{
    DeleteDayRoutesRequest, EmptyPayload, ErrorResponse, GetDayRoutesRequest, MoveStopRequest,
    ReorderStopsRequest, Request, SaveRoutesRequest, SaveRoutesResult, SuccessResponse,
};

/// Handles `routing.routes.save`.
pub async fn handle_save(
    client: Client,
    mut subscriber: Subscriber,
    persistence: Arc<RoutePersistence>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.routes.save message");
        let Some(reply) = msg.reply.clone() else {
            warn!("routing.routes.save message without reply subject");
            continue;
        };

        let request: Request<SaveRoutesRequest> = match serde_json::from_slice(&msg.payload) {
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

        let result = persistence
            .save_routes(auth.tenant_id, &request.payload.service_day, &request.payload.routes)
            .await;
        match result {
            Ok(saved_route_ids) => {
                let response = SuccessResponse::new(request.id, SaveRoutesResult { saved_route_ids });
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("save_routes failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }
    Ok(())
}

/// Handles `routing.routes.get_for_day`, materializing the day's routes on first read.
pub async fn handle_get_for_day(
    client: Client,
    mut subscriber: Subscriber,
    materializer: Arc<DailyRouteMaterializer>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.routes.get_for_day message");
        let Some(reply) = msg.reply.clone() else {
            warn!("routing.routes.get_for_day message without reply subject");
            continue;
        };

        let request: Request<GetDayRoutesRequest> = match serde_json::from_slice(&msg.payload) {
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

        let result = materializer
            .get_day_routes(auth.tenant_id, &request.payload.service_day, request.payload.route_date)
            .await;
        match result {
            Ok(routes) => {
                let response = SuccessResponse::new(request.id, routes);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("get_day_routes failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }
    Ok(())
}

/// Handles `routing.routes.reorder_stops`.
pub async fn handle_reorder_stops(
    client: Client,
    mut subscriber: Subscriber,
    persistence: Arc<RoutePersistence>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.routes.reorder_stops message");
        let Some(reply) = msg.reply.clone() else {
            warn!("routing.routes.reorder_stops message without reply subject");
            continue;
        };

        let request: Request<ReorderStopsRequest> = match serde_json::from_slice(&msg.payload) {
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

        let stops: Vec<(Uuid, u32)> = request.payload.stops.iter().map(|s| (s.stop_id, s.new_sequence)).collect();
        let result = persistence.reorder_stops(auth.tenant_id, request.payload.route_id, &stops).await;
        match result {
            Ok(()) => {
                let response = SuccessResponse::new(request.id, EmptyPayload::default());
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("reorder_stops failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }
    Ok(())
}

/// Handles `routing.routes.move_stop`.
pub async fn handle_move_stop(
    client: Client,
    mut subscriber: Subscriber,
    persistence: Arc<RoutePersistence>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.routes.move_stop message");
        let Some(reply) = msg.reply.clone() else {
            warn!("routing.routes.move_stop message without reply subject");
            continue;
        };

        let request: Request<MoveStopRequest> = match serde_json::from_slice(&msg.payload) {
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

        let result = persistence
            .move_stop(
                auth.tenant_id,
                request.payload.stop_id,
                request.payload.target_route_id,
                request.payload.insert_sequence,
            )
            .await;
        match result {
            Ok(()) => {
                let response = SuccessResponse::new(request.id, EmptyPayload::default());
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("move_stop failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }
    Ok(())
}

/// Handles `routing.routes.delete_for_day`.
pub async fn handle_delete_for_day(
    client: Client,
    mut subscriber: Subscriber,
    persistence: Arc<RoutePersistence>,
    jwt_secret: String,
) -> anyhow::Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received routing.routes.delete_for_day message");
        let Some(reply) = msg.reply.clone() else {
            warn!("routing.routes.delete_for_day message without reply subject");
            continue;
        };

        let request: Request<DeleteDayRoutesRequest> = match serde_json::from_slice(&msg.payload) {
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

        let result = persistence.delete_day(auth.tenant_id, &request.payload.service_day).await;
        match result {
            Ok(()) => {
                let response = SuccessResponse::new(request.id, EmptyPayload::default());
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("delete_for_day failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }
    Ok(())
}
