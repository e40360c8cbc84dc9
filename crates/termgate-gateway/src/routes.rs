//! Request dispatcher and route handlers.
//!
//! Every terminal request passes three gates in order: method (axum
//! rejects non-POST with 405), shape/auth (400/401), authorization
//! (403). The execution gateway is only invoked after an allow, and
//! only on the canonical path or literal command string the decision
//! was issued for.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use termgate_core::error::TermGateError;
use termgate_policy::{AccessMode, CommandDecision, PathDecision, authorize_path};

use super::server::AppState;

/// Action-tagged request body for the terminal endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TerminalRequest {
    #[serde(rename_all = "camelCase")]
    ReadFile { file_path: String },
    #[serde(rename_all = "camelCase")]
    ListDirectory { dir_path: String },
    #[serde(rename_all = "camelCase")]
    ExecuteCommand {
        command: String,
        #[serde(default)]
        cwd: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    WriteFile { file_path: String, content: String },
    #[serde(rename_all = "camelCase")]
    DeleteFile { file_path: String },
    #[serde(rename_all = "camelCase")]
    SearchFiles { pattern: String, directory: String },
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "termgate",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Map an execution-layer error to its response.
fn error_response(err: TermGateError) -> (StatusCode, Json<Value>) {
    let (status, body) = match &err {
        TermGateError::Denied(reason) => (
            StatusCode::FORBIDDEN,
            json!({"error": "Access denied", "details": reason}),
        ),
        TermGateError::NotFound(path) => (
            StatusCode::NOT_FOUND,
            json!({"error": "Not found", "details": path}),
        ),
        TermGateError::Io(detail) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "I/O error", "details": detail}),
        ),
        TermGateError::TimedOut(ms) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Command timed out", "details": format!("after {ms} ms")}),
        ),
        TermGateError::Config(_) | TermGateError::Internal(_) => {
            // Full detail stays server-side; callers get a summary.
            tracing::error!(error = %err, "internal gateway error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Internal server error"}),
            )
        }
    };
    (status, Json(body))
}

fn forbidden(reason: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "Access denied", "details": reason.to_string()})),
    )
}

fn bad_request(details: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Bad request", "details": details.to_string()})),
    )
}

/// Authorize a path or return the 403 response. The canonical path from
/// the decision is what every subsequent file operation runs on.
fn gate_path(
    state: &AppState,
    raw: &str,
    mode: AccessMode,
) -> Result<std::path::PathBuf, (StatusCode, Json<Value>)> {
    match authorize_path(&state.policy, raw, mode) {
        PathDecision::Allowed { canonical } => Ok(canonical),
        PathDecision::Denied { reason } => {
            tracing::info!(path = raw, %reason, "path denied");
            Err(forbidden(reason))
        }
    }
}

/// The terminal dispatcher — one endpoint, action-routed.
pub async fn terminal(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let request: TerminalRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return bad_request(format!("unknown or malformed action: {e}")),
    };

    match request {
        TerminalRequest::ReadFile { file_path } => {
            let canonical = match gate_path(&state, &file_path, AccessMode::Read) {
                Ok(p) => p,
                Err(resp) => return resp,
            };
            match termgate_exec::fsops::read_file(&canonical).await {
                Ok(content) => (
                    StatusCode::OK,
                    Json(json!({"success": true, "content": content, "path": file_path})),
                ),
                Err(e) => error_response(e),
            }
        }

        TerminalRequest::ListDirectory { dir_path } => {
            let canonical = match gate_path(&state, &dir_path, AccessMode::List) {
                Ok(p) => p,
                Err(resp) => return resp,
            };
            match termgate_exec::fsops::list_directory(&canonical).await {
                Ok(files) => (
                    StatusCode::OK,
                    Json(json!({"success": true, "files": files, "path": dir_path})),
                ),
                Err(e) => error_response(e),
            }
        }

        TerminalRequest::ExecuteCommand { command, cwd } => {
            match termgate_policy::authorize_command(&state.policy, &command) {
                CommandDecision::Allowed => {}
                CommandDecision::Denied { reason } => {
                    tracing::info!(command, %reason, "command denied");
                    return forbidden(reason);
                }
            }
            // The working directory is a path resource like any other.
            let cwd_canonical = match &cwd {
                Some(dir) => match gate_path(&state, dir, AccessMode::List) {
                    Ok(p) => Some(p),
                    Err(resp) => return resp,
                },
                None => None,
            };

            match termgate_exec::run_command(
                &command,
                cwd_canonical.as_deref(),
                state.policy.command_timeout(),
                state.policy.max_output_bytes(),
            )
            .await
            {
                Ok(outcome) => (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "command": command,
                        "stdout": outcome.stdout,
                        "stderr": outcome.stderr,
                        "exitCode": outcome.exit_code,
                        "durationMs": outcome.duration_ms,
                    })),
                ),
                Err(e) => error_response(e),
            }
        }

        TerminalRequest::WriteFile { file_path, content } => {
            let canonical = match gate_path(&state, &file_path, AccessMode::Write) {
                Ok(p) => p,
                Err(resp) => return resp,
            };
            match termgate_exec::fsops::write_file(&canonical, &content).await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "message": "File written successfully",
                        "path": file_path,
                    })),
                ),
                Err(e) => error_response(e),
            }
        }

        TerminalRequest::DeleteFile { file_path } => {
            let canonical = match gate_path(&state, &file_path, AccessMode::Delete) {
                Ok(p) => p,
                Err(resp) => return resp,
            };
            match termgate_exec::fsops::delete_file(&canonical).await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(json!({"success": true, "message": "File deleted", "path": file_path})),
                ),
                Err(e) => error_response(e),
            }
        }

        TerminalRequest::SearchFiles { pattern, directory } => {
            if pattern.is_empty() {
                return bad_request("search pattern must not be empty");
            }
            let canonical = match gate_path(&state, &directory, AccessMode::List) {
                Ok(p) => p,
                Err(resp) => return resp,
            };
            match termgate_exec::fsops::search_files(&canonical, &pattern).await {
                Ok(results) => (
                    StatusCode::OK,
                    Json(json!({"success": true, "results": results, "pattern": pattern})),
                ),
                Err(e) => error_response(e),
            }
        }
    }
}

/// Chat proxy endpoint — forwards a question to the collaborator.
///
/// The bearer token is passed through as the upstream credential;
/// validating it is the upstream's concern, not ours.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(question) = body.get("question").and_then(Value::as_str) else {
        return bad_request("missing field: question");
    };
    let credential = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    let reply = state.collaborator.ask(question, credential).await;
    if reply.error {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Chat proxy failed", "details": reply.message})),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({"success": true, "message": reply.message})),
        )
    }
}
