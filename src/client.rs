use crate::api::{
    self, GenerateRequest, GeneratedImage, SalesSettings,
};
use crate::error::{PortraitError, PortraitResult};
use crate::model::CreditState;

/// Boundary adapter for the consumer API. Performs transport only; response
/// interpretation lives in [`crate::api`] so it stays testable offline.
///
/// Generation is a single awaited request that can take tens of seconds
/// (external AI inference); callers present in-progress state for the
/// duration. No timeout beyond the transport default, no cancellation.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(api_base: &str) -> PortraitResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PortraitError::network(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Submit one generation request. Idempotent from the client's point of
    /// view: nothing is mutated locally, so `Network` failures are
    /// retry-safe; `AuthRequired` means the caller should acquire a
    /// credential and may retry exactly once.
    #[tracing::instrument(skip_all)]
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        token: Option<&str>,
    ) -> PortraitResult<GeneratedImage> {
        let mut req = self.http.post(self.url("/api/consumer/portrait")).json(request);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| PortraitError::network(format!("portrait request: {e}")))?;
        let (status, body) = read_response(resp).await?;
        api::interpret_generate(status, &body)
    }

    pub async fn settings(&self) -> PortraitResult<SalesSettings> {
        let resp = self
            .http
            .get(self.url("/api/consumer/settings"))
            .send()
            .await
            .map_err(|e| PortraitError::network(format!("settings request: {e}")))?;
        let (status, body) = read_response(resp).await?;
        api::interpret_settings(status, &body)
    }

    pub async fn credits(&self, token: &str) -> PortraitResult<CreditState> {
        let resp = self
            .http
            .get(self.url("/api/consumer/credits"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PortraitError::network(format!("credits request: {e}")))?;
        let (status, body) = read_response(resp).await?;
        api::interpret_credits(status, &body)
    }

    /// Create a checkout session; returns the URL to redirect the user to.
    pub async fn create_checkout(&self, pack_id: &str, token: &str) -> PortraitResult<String> {
        let resp = self
            .http
            .post(self.url("/api/consumer/checkout"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "packId": pack_id }))
            .send()
            .await
            .map_err(|e| PortraitError::network(format!("checkout request: {e}")))?;
        let (status, body) = read_response(resp).await?;
        api::interpret_checkout(status, &body)
    }

    /// Resolve a generated payload to raw image bytes: data URIs decode
    /// locally, URL payloads are fetched.
    pub async fn fetch_image(&self, image: &GeneratedImage) -> PortraitResult<Vec<u8>> {
        if let Some(decoded) = image.decode_data_uri() {
            return decoded;
        }
        let resp = self
            .http
            .get(&image.payload)
            .send()
            .await
            .map_err(|e| PortraitError::network(format!("fetch generated image: {e}")))?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(PortraitError::server(status, "generated image fetch failed"));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| PortraitError::network(format!("read generated image: {e}")))?;
        Ok(bytes.to_vec())
    }
}

async fn read_response(resp: reqwest::Response) -> PortraitResult<(u16, String)> {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .map_err(|e| PortraitError::network(format!("read response body: {e}")))?;
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("https://api.example/").unwrap();
        assert_eq!(client.base(), "https://api.example");
        assert_eq!(
            client.url("/api/consumer/settings"),
            "https://api.example/api/consumer/settings"
        );
    }
}
