//! The HTTP port implemented by the infrastructure layer.

use tripmate_types::error::HttpError;

use super::request::{ApiRequest, RawResponse};

/// Sends one request and reports what came back.
///
/// Any response, whatever its status, is `Ok`; `Err(HttpError::Network)`
/// means no response was received at all. The refresh cookie is the
/// transport's business: implementations keep it in their own jar and the
/// caller never sees it.
///
/// Implementations live in tripmate-infra (e.g., `ReqwestTransport`).
pub trait HttpTransport: Send + Sync + 'static {
    /// `bearer` is the full `Authorization` header value, if any.
    fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> impl std::future::Future<Output = Result<RawResponse, HttpError>> + Send;
}
