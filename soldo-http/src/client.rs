//! Service facade over [`RemoteGateway`].
//!
//! [`SoldoClient`] builds an empty resource or collection for a
//! [`ResourceKind`], asks it for its remote path, sends the request and
//! fills the object from the response.

use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::{Map, Number, Value};
use soldo::schema::{INTERNAL_TRANSFER, TRANSFER_FINGERPRINT_ORDER};
use soldo::{FingerprintOrder, Paginator, Resource, ResourceCollection, ResourceKind};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::auth::{OAuthCredential, OAuthTokenProvider, TokenProvider};
use crate::config::ClientConfig;
use crate::constants::FINGERPRINT_HEADER;
use crate::error::HttpError;
use crate::gateway::RemoteGateway;

/// Typed client for the Soldo business API.
#[derive(Debug, Clone)]
pub struct SoldoClient {
    gateway: RemoteGateway,
}

impl SoldoClient {
    /// Builds a client that authenticates with the OAuth client-credentials
    /// flow.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] if the credentials are missing and
    /// [`HttpError::Url`] if the API host cannot be parsed.
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        config.validate()?;
        let base_url = config.resolved_base_url()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| HttpError::Transport {
                context: "Failed to build HTTP client",
                source,
            })?;
        let tokens = OAuthTokenProvider::try_new(
            http.clone(),
            &base_url,
            OAuthCredential::new(&config.client_id, &config.client_secret),
        )?;
        let gateway = RemoteGateway::new(http, base_url, Arc::new(tokens))
            .with_timeout(config.timeout);
        Ok(Self { gateway })
    }

    /// Builds a client on top of an existing gateway.
    #[must_use]
    pub const fn with_gateway(gateway: RemoteGateway) -> Self {
        Self { gateway }
    }

    /// Builds a client with a custom token source.
    #[must_use]
    pub fn with_token_provider(base_url: url::Url, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_gateway(RemoteGateway::new(Client::new(), base_url, tokens))
    }

    /// Returns the underlying gateway.
    #[must_use]
    pub const fn gateway(&self) -> &RemoteGateway {
        &self.gateway
    }

    /// Fetches one page of a resource list.
    ///
    /// `filters` are sent as extra query parameters next to the page
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Resource`] if `kind` has no list endpoint or the
    /// response envelope is invalid, plus any gateway error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "soldo.client.get_collection", skip(self, filters), err)
    )]
    pub async fn get_collection(
        &self,
        kind: ResourceKind,
        paginator: Paginator,
        filters: &Map<String, Value>,
    ) -> Result<ResourceCollection, HttpError> {
        let mut collection = ResourceCollection::for_kind(kind)
            .ok_or_else(|| HttpError::invalid_argument(format!("{kind} has no list endpoint")))?;
        let path = collection.remote_path()?;

        let mut query = filters.clone();
        for (key, value) in paginator.to_query() {
            query.insert(key.to_owned(), Value::String(value));
        }

        let data = self.gateway.get(&path, &query).await?;
        collection.fill(&Value::Object(data))?;
        Ok(collection)
    }

    /// Fetches a single resource by id.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Resource`] if the path cannot be resolved, plus
    /// any gateway error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "soldo.client.get_item", skip(self), err)
    )]
    pub async fn get_item(&self, kind: ResourceKind, id: &str) -> Result<Resource, HttpError> {
        let mut resource = identified(kind, id)?;
        let path = resource.remote_path()?;
        let data = self.gateway.get(&path, &Map::new()).await?;
        resource.fill(&Value::Object(data))?;
        Ok(resource)
    }

    /// Updates the whitelisted attributes of a resource.
    ///
    /// Keys outside the kind's whitelist are dropped before sending.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Resource`] if `data` is empty, nothing survives
    /// the whitelist or the kind is not updatable, plus any gateway error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "soldo.client.update_item", skip(self, data), err)
    )]
    pub async fn update_item(
        &self,
        kind: ResourceKind,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<Resource, HttpError> {
        if data.is_empty() {
            return Err(HttpError::invalid_argument("update data is empty"));
        }
        if !kind.schema().is_updatable() {
            return Err(HttpError::invalid_argument(format!(
                "{kind} cannot be updated"
            )));
        }

        let mut resource = identified(kind, id)?;
        let body = resource.filter_whitelist(data);
        if body.is_empty() {
            return Err(HttpError::invalid_argument(format!(
                "no updatable attribute of {kind} in update data"
            )));
        }

        let path = resource.remote_path()?;
        let response = self.gateway.post(&path, &body, HeaderMap::new()).await?;
        resource.fill(&Value::Object(response))?;
        Ok(resource)
    }

    /// Fetches the resources of a relationship, e.g. the rules of a card.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Resource`] if the relationship is undeclared or
    /// the response has no usable entry for it, plus any gateway error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "soldo.client.get_relationship", skip(self), err)
    )]
    pub async fn get_relationship(
        &self,
        kind: ResourceKind,
        id: &str,
        relationship: &str,
    ) -> Result<Vec<Resource>, HttpError> {
        let resource = identified(kind, id)?;
        let path = resource.relationship_remote_path(relationship)?;
        let data = self.gateway.get(&path, &Map::new()).await?;
        Ok(resource.build_relationship(relationship, &Value::Object(data))?)
    }

    /// Moves money between two wallets of the company.
    ///
    /// The request is signed with the fingerprint of amount, currency and
    /// both wallet ids plus `internal_token`, sent as `X-Soldo-Fingerprint`.
    ///
    /// A whole amount such as `100.0` is signed and sent as `100`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Resource`] if the amount is not finite or
    /// the transfer cannot be built, plus
    /// any gateway error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "soldo.client.perform_transfer",
            skip(self, amount, internal_token),
            err
        )
    )]
    pub async fn perform_transfer(
        &self,
        from_wallet_id: &str,
        to_wallet_id: &str,
        amount: f64,
        currency: &str,
        internal_token: &str,
    ) -> Result<Resource, HttpError> {
        let amount = Number::from_f64(amount)
            .map(Value::Number)
            .ok_or_else(|| HttpError::invalid_argument("amount must be a finite number"))?;
        let mut transfer = Resource::new(&INTERNAL_TRANSFER);
        transfer.fill(&serde_json::json!({
            "fromWalletId": from_wallet_id,
            "toWalletId": to_wallet_id,
            "amount": amount.clone(),
            "currency": currency,
        }))?;

        let order = FingerprintOrder::new(TRANSFER_FINGERPRINT_ORDER.iter().copied())
            .map_err(soldo::SoldoError::from)?;
        let fingerprint = transfer.build_fingerprint(&order, internal_token)?;
        let path = transfer.remote_path()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(FINGERPRINT_HEADER.as_bytes()).expect("valid header name"),
            HeaderValue::from_str(&fingerprint).expect("hex digest is a valid header value"),
        );

        let mut body = Map::new();
        body.insert("amount".to_owned(), amount);
        body.insert("currencyCode".to_owned(), Value::String(currency.to_owned()));

        let response = self.gateway.post(&path, &body, headers).await?;
        transfer.fill(&Value::Object(response))?;
        Ok(transfer)
    }

    /// Lists wallets.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_collection`].
    pub async fn wallets(&self, paginator: Paginator) -> Result<ResourceCollection, HttpError> {
        self.get_collection(ResourceKind::Wallet, paginator, &Map::new())
            .await
    }

    /// Fetches a wallet.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_item`].
    pub async fn wallet(&self, id: &str) -> Result<Resource, HttpError> {
        self.get_item(ResourceKind::Wallet, id).await
    }

    /// Lists employees.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_collection`].
    pub async fn employees(&self, paginator: Paginator) -> Result<ResourceCollection, HttpError> {
        self.get_collection(ResourceKind::Employee, paginator, &Map::new())
            .await
    }

    /// Fetches an employee.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_item`].
    pub async fn employee(&self, id: &str) -> Result<Resource, HttpError> {
        self.get_item(ResourceKind::Employee, id).await
    }

    /// Updates an employee's `custom_reference_id` and `department`.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::update_item`].
    pub async fn update_employee(
        &self,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<Resource, HttpError> {
        self.update_item(ResourceKind::Employee, id, data).await
    }

    /// Lists expense centres.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_collection`].
    pub async fn expense_centres(
        &self,
        paginator: Paginator,
    ) -> Result<ResourceCollection, HttpError> {
        self.get_collection(ResourceKind::ExpenseCentre, paginator, &Map::new())
            .await
    }

    /// Fetches an expense centre.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_item`].
    pub async fn expense_centre(&self, id: &str) -> Result<Resource, HttpError> {
        self.get_item(ResourceKind::ExpenseCentre, id).await
    }

    /// Updates an expense centre's `custom_reference_id` and `assignee`.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::update_item`].
    pub async fn update_expense_centre(
        &self,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<Resource, HttpError> {
        self.update_item(ResourceKind::ExpenseCentre, id, data)
            .await
    }

    /// Lists cards.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_collection`].
    pub async fn cards(&self, paginator: Paginator) -> Result<ResourceCollection, HttpError> {
        self.get_collection(ResourceKind::Card, paginator, &Map::new())
            .await
    }

    /// Fetches a card.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_item`].
    pub async fn card(&self, id: &str) -> Result<Resource, HttpError> {
        self.get_item(ResourceKind::Card, id).await
    }

    /// Fetches the rules of a card.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_relationship`].
    pub async fn card_rules(&self, id: &str) -> Result<Vec<Resource>, HttpError> {
        self.get_relationship(ResourceKind::Card, id, "rules").await
    }

    /// Lists transactions matching `filters`.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_collection`].
    pub async fn transactions(
        &self,
        paginator: Paginator,
        filters: &Map<String, Value>,
    ) -> Result<ResourceCollection, HttpError> {
        self.get_collection(ResourceKind::Transaction, paginator, filters)
            .await
    }

    /// Fetches a transaction.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_item`].
    pub async fn transaction(&self, id: &str) -> Result<Resource, HttpError> {
        self.get_item(ResourceKind::Transaction, id).await
    }

    /// Lists groups.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_collection`].
    pub async fn groups(&self, paginator: Paginator) -> Result<ResourceCollection, HttpError> {
        self.get_collection(ResourceKind::Group, paginator, &Map::new())
            .await
    }

    /// Fetches a group.
    ///
    /// # Errors
    ///
    /// See [`SoldoClient::get_item`].
    pub async fn group(&self, id: &str) -> Result<Resource, HttpError> {
        self.get_item(ResourceKind::Group, id).await
    }

    /// Fetches the company the credentials belong to.
    ///
    /// # Errors
    ///
    /// Returns any gateway error.
    pub async fn company(&self) -> Result<Resource, HttpError> {
        let mut company = Resource::new(ResourceKind::Company.schema());
        let path = company.remote_path()?;
        let data = self.gateway.get(&path, &Map::new()).await?;
        company.fill(&Value::Object(data))?;
        Ok(company)
    }
}

fn identified(kind: ResourceKind, id: &str) -> Result<Resource, HttpError> {
    let mut resource = Resource::new(kind.schema());
    resource.set("id", Value::String(id.to_owned()))?;
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use soldo::SoldoError;
    use soldo::fingerprint::sha512_hex;
    use url::Url;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::StaticTokenProvider;

    fn client(mock_server: &MockServer) -> SoldoClient {
        SoldoClient::with_token_provider(
            Url::parse(&mock_server.uri()).unwrap(),
            Arc::new(StaticTokenProvider::new("TOKEN")),
        )
    }

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn envelope(results: Value) -> Value {
        let size = results.as_array().map_or(0, Vec::len);
        json!({
            "pages": 1,
            "total": size,
            "page_size": 50,
            "current_page": 0,
            "results_size": size,
            "results": results,
        })
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = SoldoClient::new(&ClientConfig::new("", "secret")).unwrap_err();
        assert!(matches!(err, HttpError::Config(_)));
        assert!(SoldoClient::new(&ClientConfig::new("id", "secret")).is_ok());
    }

    #[tokio::test]
    async fn test_get_collection() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/wallets"))
            .and(query_param("p", "1"))
            .and(query_param("s", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
                {"id": "W1", "currency_code": "EUR"},
                {"id": "W2", "currency_code": "GBP"},
            ]))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let wallets = client(&mock_server)
            .wallets(Paginator::new(1, 10))
            .await
            .unwrap();
        assert_eq!(wallets.items().len(), 2);
        assert_eq!(wallets.items()[1].str("id"), Some("W2"));
    }

    #[tokio::test]
    async fn test_get_collection_with_filters() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/transactions"))
            .and(query_param("type", "card"))
            .and(query_param("p", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transactions = client(&mock_server)
            .transactions(Paginator::default(), &data(json!({"type": "card"})))
            .await
            .unwrap();
        assert!(transactions.items().is_empty());
    }

    #[tokio::test]
    async fn test_get_collection_without_list_endpoint() {
        let mock_server = MockServer::start().await;
        let err = client(&mock_server)
            .get_collection(ResourceKind::Company, Paginator::default(), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HttpError::Resource(SoldoError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_get_collection_invalid_envelope() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/cards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .cards(Paginator::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Resource(SoldoError::Collection(_))));
    }

    #[tokio::test]
    async fn test_get_item_encodes_id() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/employees/an+id"))
            .and(header("Authorization", "Bearer TOKEN"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "an id", "department": "R&D"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let employee = client(&mock_server).employee("an id").await.unwrap();
        assert_eq!(employee.str("department"), Some("R&D"));
    }

    #[tokio::test]
    async fn test_get_item_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/cards/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).card("missing").await.unwrap_err();
        assert!(matches!(err, HttpError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_sends_only_whitelisted_keys() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/business/v1/employees/E1"))
            .and(body_string("department=X"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "E1", "department": "X"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let employee = client(&mock_server)
            .update_employee(
                "E1",
                &data(json!({"department": "X", "id": "SHOULD_NOT_UPDATE"})),
            )
            .await
            .unwrap();
        assert_eq!(employee.str("id"), Some("E1"));
        assert_eq!(employee.str("department"), Some("X"));
    }

    #[tokio::test]
    async fn test_update_rejections() {
        let mock_server = MockServer::start().await;
        let client = client(&mock_server);

        let err = client.update_employee("E1", &Map::new()).await.unwrap_err();
        assert!(matches!(err, HttpError::Resource(SoldoError::InvalidArgument(_))));

        let err = client
            .update_expense_centre("EC1", &data(json!({"name": "not allowed"})))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Resource(SoldoError::InvalidArgument(_))));

        let err = client
            .update_item(ResourceKind::Wallet, "W1", &data(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Resource(SoldoError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_card_rules() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/cards/C1/rules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rules": [{"name": "OpenCloseMasterLock", "enabled": true}, {"name": "Online", "enabled": false}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let rules = client(&mock_server).card_rules("C1").await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].str("name"), Some("OpenCloseMasterLock"));
        assert_eq!(rules[1].value("enabled"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_unknown_relationship() {
        let mock_server = MockServer::start().await;
        let err = client(&mock_server)
            .get_relationship(ResourceKind::Card, "C1", "owners")
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Resource(SoldoError::Relationship(_))));
    }

    #[tokio::test]
    async fn test_perform_transfer() {
        let mock_server = MockServer::start().await;
        let fingerprint = sha512_hex(b"100EURFROM-IDTO-ID123456");
        Mock::given(method("POST"))
            .and(path("/business/v1/wallets/internalTransfer/FROM-ID/TO-ID"))
            .and(header("X-Soldo-Fingerprint", fingerprint.as_str()))
            .and(body_string("amount=100&currencyCode=EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "amount": 100,
                "currency": "EUR",
                "datetime": "2017-09-18T10:21:45Z",
                "from_wallet": {"id": "FROM-ID", "available_amount": 900},
                "to_wallet": {"id": "TO-ID", "available_amount": 1100},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transfer = client(&mock_server)
            .perform_transfer("FROM-ID", "TO-ID", 100.0, "EUR", "123456")
            .await
            .unwrap();
        let to_wallet = transfer.resource("to_wallet").unwrap();
        assert_eq!(to_wallet.schema().name, "Wallet");
        assert_eq!(to_wallet.value("available_amount"), Some(&json!(1100)));
        assert_eq!(transfer.str("datetime"), Some("2017-09-18T10:21:45Z"));
    }

    #[tokio::test]
    async fn test_perform_decimal_transfer() {
        let mock_server = MockServer::start().await;
        let fingerprint = sha512_hex(b"24.5EURFROM-IDTO-ID123456");
        Mock::given(method("POST"))
            .and(path("/business/v1/wallets/internalTransfer/FROM-ID/TO-ID"))
            .and(header("X-Soldo-Fingerprint", fingerprint.as_str()))
            .and(body_string("amount=24.5&currencyCode=EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"amount": 24.5})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transfer = client(&mock_server)
            .perform_transfer("FROM-ID", "TO-ID", 24.5, "EUR", "123456")
            .await
            .unwrap();
        assert_eq!(transfer.value("amount"), Some(&json!(24.5)));
    }

    #[tokio::test]
    async fn test_transfer_rejects_non_finite_amount() {
        let mock_server = MockServer::start().await;
        let err = client(&mock_server)
            .perform_transfer("FROM-ID", "TO-ID", f64::NAN, "EUR", "123456")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HttpError::Resource(SoldoError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_company() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business/v1/company"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ACME"})))
            .mount(&mock_server)
            .await;

        let company = client(&mock_server).company().await.unwrap();
        assert_eq!(company.str("name"), Some("ACME"));
    }
}
