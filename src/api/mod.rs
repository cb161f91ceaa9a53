mod chain;
mod health;
mod mining;
pub mod models;
mod peer;
mod stats;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::get_chain_data)
            .service(chain::get_state)
            .service(chain::validate_chain)
            .service(chain::download_chain)
            .service(mining::mine_block)
            .service(mining::broadcast_block)
            .service(mining::get_difficulty)
            .service(mining::set_difficulty)
            .service(peer::deliver_block)
            .service(stats::get_stats),
    );
}
