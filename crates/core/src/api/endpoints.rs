//! Typed dashboard endpoints
//!
//! Every endpoint validates the response shape before extracting anything.
//! Calls that report success through a `result` flag only succeed when
//! `result` is exactly `true`; a forbidden response counts as failure.

use std::sync::Arc;

use recreviews_domain::constants::{
    ONBOARDING_CMS, PATH_MODULE_CONFIGURATION, PATH_MODULE_REVOKE, PATH_ONBOARDING,
    PATH_ORDERS, PATH_ORDER_STATUS, PATH_SHOP,
};
use recreviews_domain::{
    ApiError, ConfigurationPayload, Onboarding, OrderId, OrderPayload, ShopProfile, StatusPayload,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::ports::{ApiRequest, ApiResponse, ApiTransport};

pub struct RemoteApi {
    transport: Arc<dyn ApiTransport>,
}

impl RemoteApi {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the onboarding fragment shown to unlinked shops.
    ///
    /// Sent without a bearer token. `None` when the body is empty.
    #[instrument(skip(self))]
    pub async fn onboarding(
        &self,
        cms_version: &str,
        locale: &str,
    ) -> Result<Option<Onboarding>, ApiError> {
        let request = ApiRequest::get(PATH_ONBOARDING)
            .params(json!({ "cms": ONBOARDING_CMS, "version": cms_version }))
            .header("Accept-Language", locale);

        let response = self.transport.request(request).await?;
        Ok(response.into_json().filter(is_non_empty).map(Onboarding))
    }

    /// Push shop metadata after linking.
    #[instrument(skip(self, token, payload))]
    pub async fn update_module_configuration(
        &self,
        token: &str,
        payload: &ConfigurationPayload,
    ) -> Result<bool, ApiError> {
        self.post_for_result(PATH_MODULE_CONFIGURATION, token, payload).await
    }

    /// Fetch the linked shop identity.
    #[instrument(skip(self, token))]
    pub async fn shop(&self, token: &str) -> Result<Option<ShopProfile>, ApiError> {
        let request = ApiRequest::get(PATH_SHOP).bearer(Some(token));
        let response = self.transport.request(request).await?;

        if !response.is_result_true() {
            return Ok(None);
        }

        Ok(response
            .into_json()
            .and_then(|mut body| body.get_mut("shop").map(Value::take))
            .filter(|shop| !shop.is_null())
            .map(ShopProfile))
    }

    /// Report an order as valid (host status completed).
    #[instrument(skip(self, token))]
    pub async fn send_update_status(&self, token: &str, order_id: OrderId) -> Result<bool, ApiError> {
        let payload = StatusPayload::valid(order_id.to_string());
        self.post_for_result(PATH_ORDER_STATUS, token, &payload).await
    }

    /// Push an order with its customer block.
    #[instrument(skip(self, token, payload), fields(reference = %payload.order.reference))]
    pub async fn send_order_data(&self, token: &str, payload: &OrderPayload) -> Result<bool, ApiError> {
        self.post_for_result(PATH_ORDERS, token, payload).await
    }

    /// Revoke the integration on the dashboard side.
    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &str) -> Result<bool, ApiError> {
        self.post_for_result(PATH_MODULE_REVOKE, token, &json!({})).await
    }

    async fn post_for_result<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        payload: &T,
    ) -> Result<bool, ApiError> {
        let params = serde_json::to_value(payload)
            .map_err(|err| ApiError::Unknown(format!("payload encoding failed: {err}")))?;
        let request = ApiRequest::post(path).bearer(Some(token)).params(params);

        let response = self.transport.request(request).await?;
        let accepted = response.is_result_true();
        if !accepted {
            debug!(path, forbidden = matches!(response, ApiResponse::Forbidden), "dashboard did not accept request");
        }
        Ok(accepted)
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
