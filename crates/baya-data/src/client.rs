//! REST API client with endpoint tagging.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use baya_commerce::cart::{PromoValidation, PromoValidator, StockOracle, StockStatus};
use baya_commerce::catalog::{Category, Product};
use baya_commerce::checkout::{OrderGateway, OrderResponse, OrderSubmission};
use baya_commerce::{CommerceError, ProductId};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::dependency::ApiDependency;
use crate::error::FetchError;
use crate::retry::{BackoffStrategy, RetryPolicy};
use crate::timeout::{with_timeout, TimeoutConfig};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Fetch policy combining timeout and retry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Timeout configuration.
    pub timeout: TimeoutConfig,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    /// Create a new fetch policy.
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    /// Create from a dependency tag's defaults.
    pub fn from_tag(tag: ApiDependency) -> Self {
        Self {
            timeout: TimeoutConfig::from_total(tag.default_timeout()),
            retry: RetryPolicy::new(tag.default_max_retries()),
        }
    }

    /// Drop retries for methods that are not safe to repeat.
    pub fn for_method(mut self, method: &Method) -> Self {
        if *method != Method::GET && *method != Method::HEAD {
            self.retry = RetryPolicy::none();
        }
        self
    }
}

/// Where the API lives and how hard to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    /// Sent as a bearer token on back-office calls.
    pub admin_token: Option<String>,
    /// Overrides every tag's default timeout.
    pub timeout: Option<Duration>,
    /// Overrides every tag's default retry count. Writes are never retried.
    pub max_retries: Option<u32>,
    pub backoff: BackoffStrategy,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            admin_token: None,
            timeout: None,
            max_retries: None,
            backoff: BackoffStrategy::default(),
        }
    }
}

/// Typed client for the storefront REST API.
///
/// Every call runs under the [`FetchPolicy`] of its [`ApiDependency`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    settings: ApiSettings,
}

impl ApiClient {
    /// Create a client over the network.
    pub fn new(settings: ApiSettings) -> Result<Self, FetchError> {
        let connect = settings
            .timeout
            .map(|t| TimeoutConfig::from_total(t).connect)
            .unwrap_or_else(|| Duration::from_secs(3));
        let transport = ReqwestTransport::new(connect)?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    pub fn with_transport(settings: ApiSettings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// The policy a request to `tag` with `method` runs under.
    pub fn policy(&self, tag: ApiDependency, method: &Method) -> FetchPolicy {
        let mut policy = FetchPolicy::from_tag(tag);
        if let Some(total) = self.settings.timeout {
            policy.timeout = TimeoutConfig::from_total(total);
        }
        if let Some(max) = self.settings.max_retries {
            policy.retry.max_attempts = max;
        }
        policy.retry.backoff = self.settings.backoff.clone();
        policy.for_method(method)
    }

    /// Send `request`, retrying per policy. Non-2xx answers are errors.
    pub async fn execute(
        &self,
        mut request: HttpRequest,
        tag: ApiDependency,
    ) -> Result<HttpResponse, FetchError> {
        if tag == ApiDependency::Admin && request.bearer.is_none() {
            request.bearer = self.settings.admin_token.clone();
        }
        let policy = self.policy(tag, &request.method);
        let what = format!("{} {}", request.method, request.url);
        let mut attempt = 0;

        loop {
            let result = with_timeout(policy.timeout.total, &what, self.transport.send(request.clone()))
                .await
                .and_then(|response| check_status(response, &request.url));

            match result {
                Ok(response) => {
                    debug!(dependency = %tag, request = %what, attempt, "request succeeded");
                    return Ok(response);
                }
                Err(e) if policy.retry.should_retry(&e, attempt) => {
                    let delay = policy.retry.backoff.delay_for_attempt(attempt);
                    warn!(dependency = %tag, request = %what, attempt, error = %e, ?delay, "retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(dependency = %tag, request = %what, attempt, error = %e, "request failed");
                    return Err(e);
                }
            }
        }
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        tag: ApiDependency,
    ) -> Result<T, FetchError> {
        self.execute(HttpRequest::get(self.url(path)), tag)
            .await?
            .decode()
    }

    /// Send a JSON body to `path`.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: serde_json::Value,
        tag: ApiDependency,
    ) -> Result<HttpResponse, FetchError> {
        let request = HttpRequest::new(method, self.url(path)).with_json(body);
        self.execute(request, tag).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        Ok(self.get_json("/articles", ApiDependency::Catalog).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, CommerceError> {
        Ok(self.get_json("/categories", ApiDependency::Catalog).await?)
    }
}

fn check_status(response: HttpResponse, url: &str) -> Result<HttpResponse, FetchError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Http {
            status: response.status.as_u16(),
            url: url.to_string(),
            message: response.message(),
        })
    }
}

fn is_client_error(e: &FetchError) -> bool {
    e.status().is_some_and(|s| (400..500).contains(&s))
}

#[async_trait]
impl StockOracle for ApiClient {
    async fn check(&self, id: &ProductId, quantity: u32) -> Result<StockStatus, CommerceError> {
        let path = format!("/articles/check-quantity/{}/{}", id, quantity);
        Ok(self.get_json(&path, ApiDependency::Inventory).await?)
    }
}

#[async_trait]
impl PromoValidator for ApiClient {
    async fn validate(
        &self,
        code: &str,
        product_ids: &[ProductId],
    ) -> Result<PromoValidation, CommerceError> {
        let body = json!({ "promoCode": code, "productIds": product_ids });
        match self
            .send_json(Method::POST, "/promo/validate-promo-code", body, ApiDependency::Promo)
            .await
        {
            Ok(response) => Ok(response.decode()?),
            Err(e) if is_client_error(&e) => Ok(PromoValidation {
                valid: false,
                reduction: 0.0,
                message: e.server_message().map(str::to_string),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl OrderGateway for ApiClient {
    async fn create_payment_intent(&self, amount_minor: i64) -> Result<String, CommerceError> {
        let response = self
            .send_json(
                Method::POST,
                "/create-payment-intent",
                json!({ "amount": amount_minor }),
                ApiDependency::Payments,
            )
            .await?;
        let value: serde_json::Value = response.decode()?;
        let secret = match &value {
            serde_json::Value::String(s) => Some(s.as_str()),
            other => other
                .get("clientSecret")
                .or_else(|| other.get("client_secret"))
                .and_then(|s| s.as_str()),
        };
        secret
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CommerceError::PaymentFailed("réponse de paiement sans client secret".to_string()))
    }

    async fn submit_order(&self, order: &OrderSubmission) -> Result<OrderResponse, CommerceError> {
        let body = serde_json::to_value(order)?;
        match self
            .send_json(Method::POST, "/command", body, ApiDependency::Orders)
            .await
        {
            Ok(response) => Ok(response.decode()?),
            Err(e) if e.server_message().is_some() => Ok(OrderResponse {
                success: false,
                message: e.server_message().map(str::to_string),
                order_id: None,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use baya_commerce::checkout::{CustomerForm, PaymentMethod};
    use baya_commerce::catalog::OrderStatus;
    use baya_commerce::cart::CartState;
    use baya_commerce::Money;
    use http::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport answering from a script and recording every request.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(replies: Vec<Result<HttpResponse, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn sent(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Connection("script exhausted".to_string())))
        }
    }

    pub(crate) fn ok(value: serde_json::Value) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse::json(StatusCode::OK, &value))
    }

    pub(crate) fn status(code: u16, value: serde_json::Value) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse::json(StatusCode::from_u16(code).unwrap(), &value))
    }

    pub(crate) fn client(transport: Arc<ScriptedTransport>) -> ApiClient {
        let settings = ApiSettings {
            base_url: "http://api.test/".to_string(),
            admin_token: Some("jeton".to_string()),
            timeout: Some(Duration::from_secs(2)),
            max_retries: None,
            backoff: BackoffStrategy::None,
        };
        ApiClient::with_transport(settings, transport)
    }

    #[test]
    fn test_url_join() {
        let c = client(ScriptedTransport::new(vec![]));
        assert_eq!(c.url("/articles"), "http://api.test/articles");
    }

    #[test]
    fn test_writes_are_never_retried() {
        let c = client(ScriptedTransport::new(vec![]));
        assert_eq!(c.policy(ApiDependency::Catalog, &Method::GET).retry.max_attempts, 2);
        assert_eq!(c.policy(ApiDependency::Catalog, &Method::POST).retry.max_attempts, 0);
        assert_eq!(c.policy(ApiDependency::Admin, &Method::DELETE).retry.max_attempts, 0);
    }

    #[tokio::test]
    async fn test_stock_check_retries_server_errors() {
        let transport = ScriptedTransport::new(vec![
            status(503, json!({})),
            Err(FetchError::Connection("reset".to_string())),
            ok(json!({"available": 4, "isAvailable": true})),
        ]);
        let c = client(transport.clone());

        let answer = c.check(&ProductId::new("A1"), 2).await.unwrap();

        assert_eq!(answer.available, 4);
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].url, "http://api.test/articles/check-quantity/A1/2");
    }

    #[tokio::test]
    async fn test_stock_check_gives_up_after_budget() {
        let transport = ScriptedTransport::new(vec![
            status(500, json!({})),
            status(500, json!({})),
            status(500, json!({})),
            ok(json!({"available": 4, "isAvailable": true})),
        ]);
        let c = client(transport.clone());

        let err = c.check(&ProductId::new("A1"), 2).await.unwrap_err();

        assert!(matches!(err, CommerceError::Upstream(_)));
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let transport = ScriptedTransport::new(vec![status(404, json!({"message": "inconnu"}))]);
        let c = client(transport.clone());
        assert!(c.list_products().await.is_err());
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_promo_rejection_carries_server_message() {
        let transport = ScriptedTransport::new(vec![status(
            400,
            json!({"message": "Ce code promo a expiré"}),
        )]);
        let c = client(transport.clone());

        let answer = c
            .validate("ETE2023", &[ProductId::new("A1")])
            .await
            .unwrap();

        assert!(!answer.valid);
        assert_eq!(answer.message.as_deref(), Some("Ce code promo a expiré"));
        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(
            sent[0].body,
            Some(json!({"promoCode": "ETE2023", "productIds": ["A1"]}))
        );
    }

    #[tokio::test]
    async fn test_promo_sends_numeric_product_ids_as_numbers() {
        let transport = ScriptedTransport::new(vec![ok(json!({"valid": true, "reduction": 10}))]);
        let c = client(transport.clone());
        let ids: Vec<ProductId> = serde_json::from_value(json!([12, "A1"])).unwrap();

        let answer = c.validate("DIX", &ids).await.unwrap();

        assert!(answer.valid);
        assert_eq!(
            transport.sent()[0].body,
            Some(json!({"promoCode": "DIX", "productIds": [12, "A1"]}))
        );
    }

    #[tokio::test]
    async fn test_promo_server_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![status(502, json!({}))]);
        let c = client(transport.clone());
        let err = c.validate("X", &[]).await.unwrap_err();
        assert!(matches!(err, CommerceError::Upstream(_)));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_intent_secret_shapes() {
        let transport = ScriptedTransport::new(vec![
            ok(json!("pi_1_secret_a")),
            ok(json!({"clientSecret": "pi_2_secret_b"})),
            ok(json!({})),
        ]);
        let c = client(transport.clone());

        assert_eq!(c.create_payment_intent(4990).await.unwrap(), "pi_1_secret_a");
        assert_eq!(c.create_payment_intent(4990).await.unwrap(), "pi_2_secret_b");
        assert!(c.create_payment_intent(4990).await.is_err());
        assert_eq!(transport.sent()[0].body, Some(json!({"amount": 4990})));
    }

    #[tokio::test]
    async fn test_order_rejection_message_becomes_response() {
        let transport = ScriptedTransport::new(vec![status(
            409,
            json!({"message": "Stock insuffisant pour Dattes"}),
        )]);
        let c = client(transport.clone());
        let order = OrderSubmission::assemble(
            &CartState::default(),
            &CustomerForm::default(),
            None,
            None,
            Money::eur(10.0),
            OrderStatus::Pending,
            PaymentMethod::Paypal,
        )
        .unwrap();

        let response = c.submit_order(&order).await.unwrap();

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Stock insuffisant pour Dattes"));
        assert_eq!(transport.sent()[0].url, "http://api.test/command");
    }

    #[tokio::test]
    async fn test_slow_answer_times_out() {
        struct Slow;

        #[async_trait]
        impl HttpTransport for Slow {
            async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, FetchError> {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(HttpResponse::json(StatusCode::OK, &json!([])))
            }
        }

        let settings = ApiSettings {
            timeout: Some(Duration::from_millis(20)),
            max_retries: Some(0),
            backoff: BackoffStrategy::None,
            ..ApiSettings::default()
        };
        let c = ApiClient::with_transport(settings, Arc::new(Slow));

        let err = c
            .get_json::<Vec<Product>>("/articles", ApiDependency::Catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }
}
