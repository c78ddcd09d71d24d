use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::Deserialize;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::task;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::db::{self, StoredFinding};

type SharedConn = Arc<Mutex<Connection>>;

#[derive(Deserialize)]
pub struct FindingsQuery {
    pub limit: Option<u32>, // defaults to 10
}

pub async fn serve(cfg: Config, conn: SharedConn) -> eyre::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], cfg.port));
    info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(conn).into_make_service()).await?;

    Ok(())
}

pub fn router(conn: SharedConn) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Flash loan detector API running" }))
        .route("/findings", get({
            let conn = Arc::clone(&conn);
            move |q: Query<FindingsQuery>| {
                let conn = Arc::clone(&conn);
                async move { get_recent(conn, q.limit.unwrap_or(10)).await.map(Json) }
            }
        }))
        .route("/findings/:tx_hash", get({
            let conn = Arc::clone(&conn);
            move |Path(tx_hash): Path<String>| {
                let conn = Arc::clone(&conn);
                async move {
                    get_one(conn, tx_hash)
                        .await
                        .and_then(|found| found.map(Json).ok_or(StatusCode::NOT_FOUND))
                }
            }
        }))
        .layer(cors)
}

// ---------- DB wrappers (spawn_blocking) ----------

async fn get_recent(conn: SharedConn, limit: u32) -> Result<Vec<StoredFinding>, StatusCode> {
    with_conn(conn, move |db| db::recent_findings(db, limit)).await
}

async fn get_one(conn: SharedConn, tx_hash: String) -> Result<Option<StoredFinding>, StatusCode> {
    with_conn(conn, move |db| db::finding_by_tx(db, &tx_hash)).await
}

async fn with_conn<T, F>(conn: SharedConn, query: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> eyre::Result<T> + Send + 'static,
{
    let joined = task::spawn_blocking(move || {
        let db = conn
            .lock()
            .map_err(|_| eyre::eyre!("database mutex poisoned"))?;
        query(&db)
    })
    .await;

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("Query failed: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            error!("Query task panicked: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
