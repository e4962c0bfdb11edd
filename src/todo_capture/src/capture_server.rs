use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use todo_lib::{AppendEngine, CaptureConfig, CaptureError, CaptureResult};
use url::form_urlencoded;
use warp::http::header::ALLOW;
use warp::http::{Method, StatusCode};
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::views;

pub const CONTENT_FIELD: &str = "content";

#[derive(Debug, Clone, Default)]
pub struct CaptureRunOptions {
    // overrides LISTEN_ADDR
    pub listen_addr: Option<SocketAddr>,
}

pub async fn run_capture_server(options: CaptureRunOptions) -> CaptureResult<()> {
    let mut config = CaptureConfig::from_env()?;
    if let Some(addr) = options.listen_addr {
        config.listen_addr = addr;
    }
    info!(
        "todo_capture target: {}/{} {} (branch:{})",
        config.repo_owner,
        config.repo_name,
        config.file_path,
        config.branch.as_deref().unwrap_or("<default>")
    );

    let engine = Arc::new(AppendEngine::from_config(&config)?);
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("listen for ctrl-c failed: {}", err);
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received, stopping todo_capture");
    };
    let (addr, server) = warp::serve(capture_routes(engine))
        .try_bind_with_graceful_shutdown(config.listen_addr, shutdown)
        .map_err(|e| {
            CaptureError::Internal(format!("bind {} failed: {}", config.listen_addr, e))
        })?;

    info!("todo_capture running on http://{}/", addr);
    server.await;
    Ok(())
}

pub fn capture_routes(
    engine: Arc<AppendEngine>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_engine = warp::any().map(move || engine.clone());
    warp::path::end()
        .and(warp::method())
        .and(warp::body::bytes())
        .and(with_engine)
        .and_then(handle_request)
        .recover(handle_rejection)
}

async fn handle_request(
    method: Method,
    body: Bytes,
    engine: Arc<AppendEngine>,
) -> Result<Response, Infallible> {
    let resp = match method {
        Method::GET => html_response(StatusCode::OK, views::form_page()),
        Method::POST => submit_content(&body, &engine).await,
        other => {
            debug!("reject {} request on /", other);
            let page = html_response(
                StatusCode::METHOD_NOT_ALLOWED,
                views::message_page("Method not allowed"),
            );
            warp::reply::with_header(page, ALLOW, "GET, POST").into_response()
        }
    };
    Ok(resp)
}

async fn submit_content(body: &[u8], engine: &AppendEngine) -> Response {
    let content = match extract_content(body) {
        Some(content) if !content.trim().is_empty() => content,
        _ => {
            warn!("reject submission: no content provided");
            return html_response(
                StatusCode::BAD_REQUEST,
                views::message_page("No content provided"),
            );
        }
    };

    match engine.append(&content).await {
        Ok(()) => html_response(StatusCode::OK, views::success_page()),
        Err(err) => {
            if err.is_version_conflict() {
                error!("append submission failed, file changed concurrently: {}", err);
            } else {
                error!("append submission failed: {}", err);
            }
            html_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                views::message_page("Internal server error"),
            )
        }
    }
}

/// Value of the `content` field from a urlencoded body; the last one wins.
pub fn extract_content(body: &[u8]) -> Option<String> {
    form_urlencoded::parse(body)
        .filter(|(key, _)| key == CONTENT_FIELD)
        .map(|(_, value)| value.into_owned())
        .last()
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(html_response(
            StatusCode::NOT_FOUND,
            views::message_page("Not found"),
        ));
    }
    warn!("reject request: {:?}", err);
    Ok(html_response(
        StatusCode::BAD_REQUEST,
        views::message_page("Bad request"),
    ))
}

fn html_response(status: StatusCode, page: String) -> Response {
    warp::reply::with_status(warp::reply::html(page), status).into_response()
}
