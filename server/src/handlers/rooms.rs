use crate::server::{ServerCommand, ServerTx};
use actix_web::{error, web, HttpResponse, Responder, Result};

pub fn configure_room_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/rooms").route(web::get().to(list_rooms)));
}

/// Lobby listing: room name to participant count, polled by clients that
/// have not joined yet. Best-effort snapshot, no ordering guarantee.
async fn list_rooms(srv_tx: web::Data<ServerTx>) -> Result<impl Responder> {
    let (tx, rx) = tokio::sync::oneshot::channel();

    srv_tx
        .get_ref()
        .clone()
        .send(ServerCommand::ListRooms { tx })
        .await
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))?;

    let counts = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?;

    Ok(HttpResponse::Ok().json(counts))
}
