use actix_cors::Cors;
use actix_web::{App, HttpServer};
use clap::Parser;

use server::handlers;
use server::server::spawn_server;

#[derive(Parser)]
#[command(about = "Realtime whiteboard server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let srv_tx = spawn_server();

    HttpServer::new(move || {
        App::new()
            // The lobby and the websocket are fetched from a browser app
            // served by its own dev server.
            .wrap(Cors::permissive())
            .data(srv_tx.clone())
            .configure(handlers::root)
    })
    .bind(&args.bind)?
    .run()
    .await
}
