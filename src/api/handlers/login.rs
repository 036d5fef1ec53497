/*
 * Responsibility
 * - POST / : Bearer トークンを検証し、uid と時刻を埋め込んだメッセージを返す
 * - 失敗時は AppError (401/403, body なし) をそのまま返す
 * - body のパラメータは受け取るがロジックでは使わない
 */
use axum::{Json, extract::State};
use chrono::Local;

use crate::{
    api::{dto::login::LoginMessage, extractors::LoginParams},
    error::AppError,
    services::auth::{RequestHeaders, authenticate},
    state::AppState,
};

pub async fn get_login_msg(
    State(state): State<AppState>,
    headers: RequestHeaders,
    LoginParams(params): LoginParams,
) -> Result<Json<LoginMessage>, AppError> {
    tracing::info!(
        log_field = "getLoginMsg",
        arbitrary_field = "■",
        params = params.len(),
        "structured logging getLoginMsg start"
    );

    let uid = authenticate(&headers, state.verifier.as_ref()).await?;

    tracing::info!(
        log_field = "getLoginMsg",
        uid = %uid,
        project_id = %state.project_id,
        "authenticate ok"
    );

    Ok(Json(LoginMessage::for_user(&uid, Local::now().naive_local())))
}
