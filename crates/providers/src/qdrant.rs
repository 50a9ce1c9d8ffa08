use crate::ProviderError;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    cfg: QdrantConfig,
}

impl QdrantClient {
    pub fn new(cfg: QdrantConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.cfg.url.trim_end_matches('/'),
            self.cfg.collection,
            suffix
        )
    }

    async fn send(&self, mut builder: RequestBuilder) -> Result<Response, ProviderError> {
        if let Some(key) = &self.cfg.api_key {
            builder = builder.header("api-key", key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::RequestFailed(format!(
                "status {} body {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(resp)
    }

    /// Creates the collection with Euclid distance unless it already exists.
    pub async fn ensure_collection(&self, dimension: usize) -> Result<(), ProviderError> {
        if self.send(self.client.get(self.collection_url(""))).await.is_ok() {
            return Ok(());
        }
        let body = serde_json::json!({
            "vectors": { "size": dimension, "distance": "Euclid" }
        });
        self.send(self.client.put(self.collection_url("")).json(&body))
            .await?;
        Ok(())
    }

    pub async fn search(
        &self,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<serde_json::Value>,
    ) -> Result<QdrantSearchResponse, ProviderError> {
        #[derive(Serialize)]
        struct SearchRequest {
            vector: Vec<f32>,
            limit: u64,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<serde_json::Value>,
        }
        let body = SearchRequest {
            vector,
            limit,
            filter,
        };
        let resp = self
            .send(self.client.post(self.collection_url("/points/search")).json(&body))
            .await?;
        resp.json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    pub async fn upsert(&self, points: Vec<QdrantPoint>) -> Result<(), ProviderError> {
        let req = QdrantUpsert { points };
        self.send(
            self.client
                .put(format!("{}?wait=true", self.collection_url("/points")))
                .json(&req),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_by_filter(&self, filter: serde_json::Value) -> Result<(), ProviderError> {
        #[derive(Serialize)]
        struct DeletePoints {
            filter: serde_json::Value,
        }
        let body = DeletePoints { filter };
        self.send(
            self.client
                .post(self.collection_url("/points/delete"))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, ProviderError> {
        #[derive(Deserialize)]
        struct CountResult {
            count: u64,
        }
        #[derive(Deserialize)]
        struct CountResponse {
            result: CountResult,
        }
        let resp = self
            .send(
                self.client
                    .post(self.collection_url("/points/count"))
                    .json(&serde_json::json!({ "exact": true })),
            )
            .await?;
        let parsed: CountResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(parsed.result.count)
    }
}

#[derive(Debug, Serialize)]
pub struct QdrantUpsert {
    pub points: Vec<QdrantPoint>,
}

#[derive(Debug, Serialize)]
pub struct QdrantPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct QdrantSearchResponse {
    pub result: Vec<SearchResult>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchResult {
    pub id: serde_json::Value,
    pub score: f32,
    pub payload: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_http;

    fn client(url: String, api_key: Option<&str>) -> QdrantClient {
        QdrantClient::new(QdrantConfig {
            url,
            collection: "legal_sections".into(),
            api_key: api_key.map(str::to_string),
        })
    }

    #[test]
    fn point_ids_serialize_as_integers() {
        let point = QdrantPoint {
            id: 7,
            vector: vec![0.5, 0.25],
            payload: HashMap::from([("chunk_id".to_string(), serde_json::json!("Section 1_0"))]),
        };
        let json = serde_json::to_value(QdrantUpsert { points: vec![point] }).unwrap();
        assert_eq!(json["points"][0]["id"], serde_json::json!(7));
        assert_eq!(json["points"][0]["payload"]["chunk_id"], "Section 1_0");
    }

    #[test]
    fn collection_urls_trim_trailing_slash() {
        let client = QdrantClient::new(QdrantConfig {
            url: "http://localhost:6333/".into(),
            collection: "legal_sections".into(),
            api_key: None,
        });
        assert_eq!(
            client.collection_url("/points/search"),
            "http://localhost:6333/collections/legal_sections/points/search"
        );
    }

    #[tokio::test]
    async fn search_returns_integer_ids_and_payloads() {
        let body = r#"{"result":[
            {"id":3,"score":0.12,"payload":{"chunk_id":"Section 15_0"}},
            {"id":0,"score":0.48,"payload":null}
        ],"status":"ok","time":0.001}"#;
        let (base, server) = mock_http::serve(vec![(200, body.into())]).await;
        let resp = client(base, Some("secret"))
            .search(vec![0.1, 0.2], 2, None)
            .await
            .unwrap();
        let ids: Vec<Option<u64>> = resp.result.iter().map(|r| r.id.as_u64()).collect();
        assert_eq!(ids, vec![Some(3), Some(0)]);
        assert_eq!(
            resp.result[0].payload.as_ref().unwrap()["chunk_id"],
            "Section 15_0"
        );

        let seen = server.await.unwrap();
        assert!(seen[0]
            .request_line
            .starts_with("POST /collections/legal_sections/points/search"));
        assert!(seen[0].headers.contains("api-key: secret"));
        let sent: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(sent["limit"], 2);
        assert!(sent.get("filter").is_none());
    }

    #[tokio::test]
    async fn count_reads_the_result_count() {
        let (base, _server) = mock_http::serve(vec![(
            200,
            r#"{"result":{"count":42},"status":"ok"}"#.into(),
        )])
        .await;
        assert_eq!(client(base, None).count().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn error_status_is_a_failed_request() {
        let (base, _server) = mock_http::serve(vec![(
            404,
            r#"{"status":{"error":"Collection not found"}}"#.into(),
        )])
        .await;
        let err = client(base, None).count().await.unwrap_err();
        match err {
            ProviderError::RequestFailed(msg) => {
                assert!(msg.contains("404"), "{msg}");
                assert!(msg.contains("Collection not found"), "{msg}");
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ensure_collection_creates_when_missing() {
        let (base, server) = mock_http::serve(vec![
            (404, r#"{"status":{"error":"Not found"}}"#.into()),
            (200, r#"{"result":true,"status":"ok"}"#.into()),
        ])
        .await;
        client(base, None).ensure_collection(384).await.unwrap();

        let seen = server.await.unwrap();
        assert!(seen[0].request_line.starts_with("GET /collections/legal_sections"));
        assert!(seen[1].request_line.starts_with("PUT /collections/legal_sections"));
        let sent: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
        assert_eq!(sent["vectors"]["size"], 384);
        assert_eq!(sent["vectors"]["distance"], "Euclid");
    }
}
