/*!
 * Request extractors
 *
 * Responsibility:
 * - HTTP リクエストを handler が使う型付きの値へ変換する
 *
 * Public API:
 * - RequestHeaders (FromRequestParts, services::auth の型)
 * - LoginParams
 */

mod login_params;
mod request_headers;

pub use login_params::LoginParams;
