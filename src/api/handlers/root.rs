/*
 * Responsibility
 * - GET / と GET /test (疎通用、固定文字列を返す)
 * - 構造化ログのフィールド付与 (log_field で handler を識別)
 */

pub const ROOT_MESSAGE: &str = "ルートディレクトリ起動";
pub const TEST_MESSAGE: &str = "Hello World!!!!!!!!";

pub async fn index() -> &'static str {
    tracing::info!(
        log_field = "index",
        arbitrary_field = "任意の領域",
        "structured logging"
    );
    ROOT_MESSAGE
}

pub async fn test() -> &'static str {
    tracing::info!(
        log_field = "test",
        arbitrary_field = "任意の領域",
        "structured logging"
    );
    TEST_MESSAGE
}
