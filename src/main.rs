#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    routes::{
        search::search_students,
        students::{get_students, post_add_student, post_delete_student, post_edit_student},
    },
    state::SsisState,
};
use axum::{
    Router,
    routing::{get, post},
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod images;
mod maud_conveniences;
mod pagination;
mod routes;
mod search;
mod state;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().expect("unable to load env vars");

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    let options = PgPoolOptions::new().max_connections(15);
    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = SsisState::new(options, config)
        .await
        .expect("unable to create state");

    let trace_layer = TraceLayer::new_for_http();

    //pictures cap out at 1 MiB, anything much bigger than that is junk
    let body_limit = RequestBodyLimitLayer::new(2 * 1024 * 1024);

    let app = Router::new()
        .route("/", get(get_students))
        .route("/student", get(get_students))
        .route("/student/add", post(post_add_student))
        .route("/student/delete", post(post_delete_student))
        .route("/student/edit", post(post_edit_student))
        .route(
            "/student/search",
            get(search_students).post(search_students),
        )
        .layer(body_limit)
        .layer(trace_layer)
        .with_state(state);

    let server_ip = env::var("SSIS_SERVER_IP").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("unable to serve app");
}
