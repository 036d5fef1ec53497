/*
 * Responsibility
 * - リクエストヘッダの型付きビュー (RequestHeaders)
 * - key は case-sensitive のまま保持し、authorization の探索順は authenticator 側の契約として明示する
 * - 同名ヘッダが複数ある / 値が文字列にならない場合は「無い」扱い
 */
use std::collections::HashMap;

use axum::http::HeaderMap;

#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    // None: 同じ名前が複数回出てきた (値を一つに決められない)
    values: HashMap<String, Option<String>>,
}

impl RequestHeaders {
    /// Build from raw name/value pairs, keeping names exactly as given.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values: HashMap<String, Option<String>> = HashMap::new();
        for (name, value) in pairs {
            values
                .entry(name.into())
                .and_modify(|slot| *slot = None)
                .or_insert_with(|| Some(value.into()));
        }
        Self { values }
    }

    /// Build from an HTTP header map. Names arrive lower-cased from `http`.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let values = headers
            .keys()
            .map(|name| {
                let mut all = headers.get_all(name).iter();
                let single = match (all.next(), all.next()) {
                    (Some(v), None) => v.to_str().ok().map(str::to_string),
                    _ => None,
                };
                (name.as_str().to_string(), single)
            })
            .collect();
        Self { values }
    }

    /// Case-sensitive lookup. Ambiguous headers resolve to `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }

    /// `authorization` first, then `Authorization`.
    pub fn authorization(&self) -> Option<&str> {
        self.get("authorization")
            .or_else(|| self.get("Authorization"))
    }
}
