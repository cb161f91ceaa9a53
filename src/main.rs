use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use log::{error, info};

use replichain::api::{self, AppState};
use replichain::{ConfigError, HttpTransport, Node, NodeConfig};

fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let config = NodeConfig::from_env().map_err(startup_error)?;
    let roster = config.roster().map_err(startup_error)?;
    // The blocking peer client is created here and dropped after the runtime
    // exits; it must not live only inside async tasks.
    let transport = HttpTransport::new(config.peer_urls(), config.peer_timeout)
        .map_err(startup_error)?;
    let node = Arc::new(
        Node::new(roster, config.difficulty, Arc::new(transport))
            .with_mine_timeout(config.mine_timeout),
    );

    let served = actix_web::rt::System::new().block_on(serve(config, node.clone()));
    drop(node);
    served
}

async fn serve(config: NodeConfig, node: Arc<Node>) -> io::Result<()> {
    info!(
        "⛓️ Node {} listening at http://{}:{} (roster={:?}, difficulty={})",
        node.id(),
        config.host,
        config.port,
        node.roster().members(),
        node.difficulty()
    );

    let state = web::Data::new(AppState::new(node));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn startup_error(e: ConfigError) -> io::Error {
    error!("startup failed: {e}");
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}
