use std::time::Duration;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::error::DatabaseError;

const UNIQUE_VIOLATION_CODE: &str = "23505";

/// SQLSTATE carried in a PostgREST error body.
fn postgres_code(error_text: &str) -> Option<String> {
    serde_json::from_str::<Value>(error_text)
        .ok()?
        .get("code")?
        .as_str()
        .map(str::to_string)
}

/// PostgREST client shared by every store. Built once at startup and handed
/// to the stores that need it.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Result<Self, DatabaseError> {
        if config.supabase_url.is_empty() {
            return Err(DatabaseError::Configuration("SUPABASE_URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        })
    }

    fn get_headers(&self) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| DatabaseError::Configuration(format!("invalid service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| DatabaseError::Configuration(format!("invalid service key: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DatabaseError::Unauthorized(error_text),
                404 => DatabaseError::NotFound(error_text),
                409 if postgres_code(&error_text).as_deref() == Some(UNIQUE_VIOLATION_CODE) => {
                    DatabaseError::UniqueViolation(error_text)
                }
                code => DatabaseError::Api { status: code, message: error_text },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GET a PostgREST path and decode every row.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<Value> = self.request(Method::GET, path, None).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(DatabaseError::from))
            .collect()
    }

    /// Insert one row and return its stored representation.
    pub async fn insert<T>(&self, table: &str, row: Value) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self
            .request_with_headers(Method::POST, &path, Some(row), Some(return_representation()))
            .await?;

        if rows.is_empty() {
            return Err(DatabaseError::Api {
                status: 200,
                message: format!("insert into {} returned no rows", table),
            });
        }

        Ok(rows.remove(0))
    }

    /// PATCH the rows matched by `path` and return them.
    pub async fn update<T>(&self, path: &str, changes: Value) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(Method::PATCH, path, Some(changes), Some(return_representation()))
            .await
    }

    /// Reachability check against the PostgREST root.
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let _: Value = self.request(Method::GET, "/rest/v1/", None).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    pub fn shutdown(self) {
        info!("Closing Supabase client for {}", self.base_url);
        drop(self.client);
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SupabaseClient {
        let config = AppConfig {
            supabase_url: server.uri(),
            supabase_service_key: "test-service-key".to_string(),
            ..AppConfig::default()
        };
        SupabaseClient::new(&config).unwrap()
    }

    #[test]
    fn rejects_missing_url() {
        let result = SupabaseClient::new(&AppConfig::default());
        assert_matches!(result, Err(DatabaseError::Configuration(_)));
    }

    #[tokio::test]
    async fn select_sends_service_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/doctors"))
            .and(query_param("doctorId", "eq.D001001"))
            .and(header("apikey", "test-service-key"))
            .and(header("authorization", "Bearer test-service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "doctorId": "D001001" }])))
            .mount(&server)
            .await;

        let rows: Vec<Value> = client_for(&server)
            .select("/rest/v1/doctors?doctorId=eq.D001001")
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["doctorId"], "D001001");
    }

    #[tokio::test]
    async fn conflict_status_maps_to_unique_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/appointments"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"appointments_active_slot\""
            })))
            .mount(&server)
            .await;

        let result: Result<Value, _> = client_for(&server)
            .insert("appointments", json!({ "appointmentId": "A123456XYZ" }))
            .await;

        assert_matches!(result, Err(DatabaseError::UniqueViolation(msg)) if msg.contains("23505"));
    }

    #[tokio::test]
    async fn foreign_key_conflict_is_not_a_unique_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23503",
                "message": "insert or update on table \"appointments\" violates foreign key constraint"
            })))
            .mount(&server)
            .await;

        let result: Result<Value, _> = client_for(&server)
            .insert("appointments", json!({ "appointmentId": "A123456XYZ" }))
            .await;

        assert_matches!(result, Err(DatabaseError::Api { status: 409, message }) if message.contains("23503"));
    }

    #[tokio::test]
    async fn server_errors_keep_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/patients"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result: Result<Vec<Value>, _> = client_for(&server).select("/rest/v1/patients").await;

        assert_matches!(result, Err(DatabaseError::Api { status: 503, .. }));
    }
}
