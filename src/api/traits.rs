use crate::error::ApiResult;
use async_trait::async_trait;
use serde_json::Value;

/// Read access to the listings API.
///
/// Everything above this seam works on typed models; implementations only
/// move JSON. `HttpClient` is the production transport, tests plug in
/// in-memory fakes.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// GET `path` with `query` appended and return the decoded JSON body
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value>;

    /// Name of the backend, used in log lines
    fn source_name(&self) -> &'static str;
}
