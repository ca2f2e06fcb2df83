//! Shell upgrade endpoint

use axum::{
    extract::{
        rejection::QueryRejection,
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use futures::StreamExt;
use tracing::{info, info_span, warn, Instrument};
use unitshell_domain::{ShellError, ShellOptions, ShellRequest, ShellResult, ShellStream};
use unitshell_units::TargetResolver;

use crate::{
    bridge::{bridge, EndReason},
    error::{ApiError, ApiResult},
    models::ShellQuery,
    reporter::report,
    session::{SessionState, ShellSession},
    state::AppState,
};

/// Open an interactive shell on one unit of an application
#[utoipa::path(
    get,
    path = "/apps/{app}/shell",
    params(
        ("app" = String, Path, description = "Application name"),
        ShellQuery,
    ),
    responses(
        (status = 101, description = "Switching to the WebSocket protocol; failures are reported in-band as a text frame followed by a close"),
        (status = 400, description = "Not a WebSocket upgrade request")
    )
)]
pub async fn open_shell(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
    Path(app): Path<String>,
    query: Result<Query<ShellQuery>, QueryRejection>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let ws = ws.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    // Malformed query strings are reported in-band like any other bad parameter.
    let query = query.map(|Query(query)| query).map_err(|e| e.body_text());
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    Ok(ws.on_upgrade(move |socket| run_session(socket, state, app, query, authorization)))
}

async fn run_session(
    socket: WebSocket,
    state: AppState,
    app: String,
    query: Result<ShellQuery, String>,
    authorization: Option<String>,
) {
    let unit = query.as_ref().ok().and_then(|q| q.unit.clone());
    let mut session = ShellSession::new(app, unit);
    let span = info_span!(
        "shell",
        session = %session.id(),
        app = %session.app(),
        unit = session.unit().unwrap_or_default(),
    );

    async move {
        let (mut sink, source) = socket.split();
        info!("Shell connection accepted");

        let connecting = connect(&state, session.app(), &query, authorization.as_deref());
        let result = match tokio::time::timeout(state.connect_timeout, connecting).await {
            Ok(result) => result,
            Err(_) => Err(ShellError::ConnectTimeout(state.connect_timeout.as_secs())),
        };

        match result {
            Ok(stream) => {
                advance(&mut session, SessionState::Bridging);
                let end = bridge(sink, source, stream).await;
                advance(&mut session, SessionState::Closed);
                match &end.reason {
                    EndReason::Io(err) => warn!(
                        error = %err,
                        bytes_in = end.bytes_in,
                        bytes_out = end.bytes_out,
                        "Shell session broken"
                    ),
                    reason => info!(
                        %reason,
                        bytes_in = end.bytes_in,
                        bytes_out = end.bytes_out,
                        elapsed_ms = session.elapsed_ms(),
                        "Shell session ended"
                    ),
                }
            }
            Err(err) => {
                report(&mut sink, &err).await;
                advance(&mut session, SessionState::Closed);
            }
        }
    }
    .instrument(span)
    .await
}

/// Gate, validate, resolve and start, in that order
async fn connect(
    state: &AppState,
    app_name: &str,
    query: &Result<ShellQuery, String>,
    authorization: Option<&str>,
) -> ShellResult<ShellStream> {
    let authorized = state.gate.authorize(authorization, app_name).await?;
    let query = query
        .as_ref()
        .map_err(|e| ShellError::InvalidRequest(e.clone()))?;

    let request = ShellRequest::parse(
        app_name,
        query.width.as_deref(),
        query.height.as_deref(),
        query.term.as_deref(),
        query.unit.as_deref(),
    )?;

    let target = TargetResolver::resolve(
        state.directory.as_ref(),
        &authorized.app,
        request.unit.as_deref(),
    )
    .await?;
    let unit_id = target.unit.id.clone();

    let stream = state
        .directory
        .start_shell(ShellOptions::new(target, &request))
        .await?;
    info!(
        subject = %authorized.identity.subject,
        unit = %unit_id,
        size = %request.size,
        term = %request.term,
        "Shell started"
    );
    Ok(stream)
}

fn advance(session: &mut ShellSession, next: SessionState) {
    if let Err(e) = session.transition(next) {
        warn!(error = %e, "Unexpected session transition");
    }
}
