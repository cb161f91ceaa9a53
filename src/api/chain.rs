use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{AppState, ChainResponse, ValidateResponse};

/// Get the full chain as JSON.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.node.blocks();
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        difficulty: state.node.difficulty(),
        chain,
    })
}

/// Full chain in wire form; peers call this while downloading.
#[get("/chain/data/")]
pub async fn get_chain_data(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(state.node.chain_data())
}

/// Chain length and last block hash, read together.
#[get("/state/")]
pub async fn get_state(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.node.state())
}

/// Check genesis and link continuity of the local chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let (valid, length) = state.node.validity();
    HttpResponse::Ok().json(ValidateResponse {
        valid,
        length,
        difficulty: state.node.difficulty(),
    })
}

/// Replace the local chain with the best chain found among peers.
#[post("/chain/download/")]
pub async fn download_chain(state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let node = state.node.clone();
    let result = web::block(move || node.download_chain()).await??;
    info!(
        "POST /chain/download/ - node {} now at length {}",
        state.node.id(),
        result.length
    );
    Ok(HttpResponse::Ok().json(result))
}
