//! Shared test helpers for `recreviews-core` integration tests.
//!
//! In-memory stores and a scripted transport, plus a [`Harness`] that wires
//! them into the services under test around a shared mock clock.

#![allow(dead_code)]

pub mod stores;
pub mod transport;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use recreviews_common::testing::{Clock, MockClock};
use recreviews_core::{OAuthClient, OAuthFlow, OrderSyncEngine, RemoteApi, SyncSettings, TokenStore};
use recreviews_domain::constants::{
    OPTION_OAUTH_CLIENT_ID, OPTION_OAUTH_CODE_VERIFIER, OPTION_OAUTH_TOKEN,
};
use recreviews_domain::{AccessToken, Customer, Order, OrderLine, OrderSyncRecord, ShopConfig, TokenResponse};

pub use stores::{InMemoryConfigStore, InMemoryOrderStore};
pub use transport::RecordingTransport;

pub const BASE_URL: &str = "https://dashboard.test/";

pub struct Harness {
    pub clock: MockClock,
    pub config: Arc<InMemoryConfigStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub transport: Arc<RecordingTransport>,
    pub tokens: Arc<TokenStore>,
    pub flow: OAuthFlow,
    pub engine: OrderSyncEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_shop(shop_config())
    }

    pub fn with_shop(shop: ShopConfig) -> Self {
        let clock = MockClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let config = Arc::new(InMemoryConfigStore::default());
        let orders = Arc::new(InMemoryOrderStore::default());
        let transport = Arc::new(RecordingTransport::default());

        let oauth = OAuthClient::new(transport.clone());
        let api = Arc::new(RemoteApi::new(transport.clone()));
        let tokens = Arc::new(TokenStore::new(config.clone(), oauth.clone(), Arc::new(clock.clone())));

        let flow = OAuthFlow::new(
            config.clone(),
            Arc::clone(&tokens),
            oauth,
            Arc::clone(&api),
            Arc::new(clock.clone()),
            shop,
            BASE_URL,
        );
        let engine = OrderSyncEngine::new(
            orders.clone(),
            config.clone(),
            Arc::clone(&tokens),
            api,
            Arc::new(clock.clone()),
            SyncSettings {
                placeholder_image_url: Some("https://shop.test/placeholder.png".into()),
                lock_ttl_secs: 600,
            },
        );

        Self { clock, config, orders, transport, tokens, flow, engine }
    }

    /// Store a token valid for `valid_for` along with the refresh inputs.
    pub fn link(&self, access: &str, valid_for: Duration) {
        let response = TokenResponse {
            token_type: "Bearer".into(),
            access_token: access.into(),
            refresh_token: Some("refresh-1".into()),
            expires_in: valid_for.num_seconds(),
        };
        let token = AccessToken::issue(response, self.clock.now(), None).unwrap();
        self.config.seed(OPTION_OAUTH_TOKEN, &serde_json::to_string(&token).unwrap());
        self.config.seed(OPTION_OAUTH_CLIENT_ID, "client-1");
        self.config.seed(OPTION_OAUTH_CODE_VERIFIER, "verifier-1");
    }
}

pub fn shop_config() -> ShopConfig {
    ShopConfig {
        name: "Test Shop".into(),
        url: "https://shop.test/shop/".into(),
        logo_url: Some("https://shop.test/logo.png".into()),
        cms_version: "8.9.1".into(),
        locale: "fr_FR".into(),
        placeholder_image_url: Some("https://shop.test/placeholder.png".into()),
        redirect_uri: "https://shop.test/wp-admin/admin.php?page=recreviews".into(),
    }
}

/// Processing order for customer 7 with `line_count` lines.
pub fn order(id: u64, line_count: usize, sync: Option<OrderSyncRecord>) -> Order {
    Order {
        id,
        created_at: Utc.with_ymd_and_hms(2024, 4, 30, 8, 15, 0).unwrap(),
        status: "processing".into(),
        currency: "EUR".into(),
        customer: Customer {
            id: 7,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "0102030405".into(),
        },
        lines: (0..line_count)
            .map(|i| OrderLine {
                product_id: 100 + i as u64,
                name: format!("Product {i}"),
                image_url: None,
                price: "10.00".into(),
            })
            .collect(),
        sync,
    }
}

pub fn sent_record() -> OrderSyncRecord {
    let mut record = OrderSyncRecord::new();
    record.mark_sent(Utc.with_ymd_and_hms(2024, 4, 30, 9, 0, 0).unwrap()).unwrap();
    record
}
