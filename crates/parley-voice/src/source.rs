use parley_correlation::{ReadError, ResultSource};
use parley_types::{ReadResultResponse, RequestId};
use std::time::Duration;

/// Reads results through the ingress endpoint's GET path.
#[derive(Debug, Clone)]
pub struct HttpResultSource {
    client: reqwest::Client,
    result_url: String,
    timeout: Duration,
}

impl HttpResultSource {
    pub fn new(client: reqwest::Client, result_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            result_url: result_url.into(),
            timeout,
        }
    }
}

impl ResultSource for HttpResultSource {
    type Output = String;

    async fn fetch(&self, request_id: &RequestId) -> Result<Option<String>, ReadError> {
        tracing::debug!(request_id = %request_id, "fetching result");

        let resp = self
            .client
            .get(&self.result_url)
            .query(&[("request_id", request_id.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ReadError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ReadError::Status(resp.status().as_u16()));
        }

        let body: ReadResultResponse = resp
            .json()
            .await
            .map_err(|e| ReadError::Decode(e.to_string()))?;

        Ok(body.response.filter(|text| !text.trim().is_empty()))
    }
}
