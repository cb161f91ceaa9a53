use actix_web::{HttpResponse, post, web};
use log::debug;

use super::models::AppState;
use crate::error::NodeError;
use crate::transport::http::DeliverResponse;

/// A peer proposes its freshly mined block; reply with our vote.
#[post("/blocks/deliver/")]
pub async fn deliver_block(
    state: web::Data<AppState>,
    body: String,
) -> Result<HttpResponse, NodeError> {
    let vote = state.node.deliver(&body)?;
    debug!("POST /blocks/deliver/ - node {} votes {:?}", state.node.id(), vote);
    Ok(HttpResponse::Ok().json(DeliverResponse { vote }))
}
