//! Demo server: an HTML index, a greeting that reads the query string, and a
//! JSON form endpoint.
//!
//! Run with `cargo run --example hello -- 8080` (or set `PORT`).

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};

use bottle_rs::{HttpServer, Router, ServerConfig};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = match std::env::args().nth(1).or_else(|| std::env::var("PORT").ok()) {
        Some(port) => port.parse::<u16>()?,
        None => 8080,
    };

    let mut app = Router::new();

    app.get("/", |_req, res| Box::pin(async move {
        res.html("<h1>Hello, GoBottle!</h1>").await?;
        Ok(())
    }));

    app.get("/hello", |req, res| Box::pin(async move {
        let mut name = req.query("name");
        if name.is_empty() {
            name = "World".to_string();
        }
        res.html(&format!("<h1>Hello, {name}!</h1>")).await?;
        Ok(())
    }));

    app.post("/submit", |req, res| Box::pin(async move {
        let name = req.form_value("name").await;
        if !name.is_empty() {
            info!("Form submitted by {name}");
        }
        res.json(&HashMap::from([("status", "received")])).await?;
        Ok(())
    }));

    let config = ServerConfig {
        addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        ..ServerConfig::default()
    };

    info!("Server starting on :{port}...");
    HttpServer::new(config, app).start().await?;

    Ok(())
}
