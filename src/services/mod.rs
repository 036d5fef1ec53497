/*
 * Responsibility
 * - HTTP に依存しないアプリのロジック
 *   - auth: Bearer 認証 (header → token → 検証)
 *   - identity: ID token verifier (Firebase)
 *   - project_id / credentials: 起動時のみ使う解決処理
 */
pub mod auth;
pub mod credentials;
pub mod identity;
pub mod project_id;
