/*
 * Responsibility
 * - URL 構造を定義
 * - GET / と GET /test は認証なし、POST / は handler 内で Bearer 認証
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::handlers::{
    login::get_login_msg,
    root::{index, test},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(get_login_msg))
        .route("/test", get(test))
}
