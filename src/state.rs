/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - verifier: 起動時に一度だけ作る ID token verifier (読み取り専用で共有)
 *   - project_id: 起動時に解決した project id
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{identity::IdTokenVerifier, project_id::ProjectId};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdTokenVerifier>,
    pub project_id: ProjectId,
}

impl AppState {
    pub fn new(verifier: Arc<dyn IdTokenVerifier>, project_id: ProjectId) -> Self {
        Self {
            verifier,
            project_id,
        }
    }
}
