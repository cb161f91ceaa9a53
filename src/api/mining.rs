use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{
    AppState, BroadcastResponse, DifficultyResponse, MineRequest, MineResponse,
    SetDifficultyRequest,
};
use crate::node::BroadcastOutcome;

/// Mine a block on the current tip and hold it as the pending block.
/// The chain is unchanged until `/broadcast/`.
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    req: web::Json<MineRequest>,
) -> actix_web::Result<HttpResponse> {
    let node = state.node.clone();
    let data = req.into_inner().data;
    // PoW is CPU-bound; keep it off the workers answering peers.
    let block = web::block(move || node.mine(&data)).await??;

    info!(
        "POST /mine/ - node {} holds block #{} (hash={})",
        state.node.id(),
        block.index,
        block.hash
    );
    Ok(HttpResponse::Ok().json(MineResponse {
        block: block.to_wire(),
        index: block.index,
        hash: block.hash,
        nonce: block.nonce,
        difficulty: block.difficulty,
    }))
}

/// Propose the pending block to every roster member.
#[post("/broadcast/")]
pub async fn broadcast_block(state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let node = state.node.clone();
    let outcome = web::block(move || node.broadcast()).await??;

    let resp = match outcome {
        BroadcastOutcome::Accepted => BroadcastResponse {
            accepted: true,
            rejected_by: None,
        },
        BroadcastOutcome::Rejected { peer } => {
            warn!("POST /broadcast/ - rejected by node {peer}");
            BroadcastResponse {
                accepted: false,
                rejected_by: Some(peer),
            }
        }
    };
    Ok(HttpResponse::Ok().json(resp))
}

/// Get current PoW difficulty.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: state.node.difficulty(),
    })
}

/// Update PoW difficulty (affects future mining and validation only).
#[post("/difficulty/")]
pub async fn set_difficulty(
    state: web::Data<AppState>,
    body: web::Json<SetDifficultyRequest>,
) -> actix_web::Result<HttpResponse> {
    state.node.set_difficulty(body.difficulty)?;
    Ok(HttpResponse::Ok().json(DifficultyResponse {
        difficulty: state.node.difficulty(),
    }))
}
