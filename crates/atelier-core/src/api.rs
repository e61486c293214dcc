//! Remote storefront endpoints: cart read/write and product lookup.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ShopConfig;
use crate::error::{CoreError, CoreResult};

pub type LineItemId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    pub item_count: u32,
    /// Minor currency units.
    pub total_price: u64,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn item(&self, id: LineItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: LineItemId,
    pub quantity: u32,
    pub price: u64,
    pub product_title: String,
    #[serde(default)]
    pub variant_title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
}

#[async_trait]
pub trait CartApi: Send + Sync {
    async fn get_cart(&self) -> CoreResult<Cart>;

    /// Set a line's quantity; 0 removes the line.
    async fn change_quantity(&self, id: LineItemId, quantity: u32) -> CoreResult<Cart>;
}

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn product(&self, handle: &str) -> CoreResult<Product>;
}

#[derive(Debug, Serialize)]
struct ChangeRequest {
    id: LineItemId,
    quantity: u32,
}

/// HTTP client for the storefront's AJAX endpoints.
#[derive(Debug, Clone)]
pub struct HttpStorefrontClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStorefrontClient {
    pub fn new(cfg: &ShopConfig) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("atelier/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        url: String,
        response: reqwest::Response,
    ) -> CoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Http {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CartApi for HttpStorefrontClient {
    async fn get_cart(&self) -> CoreResult<Cart> {
        let url = self.endpoint("cart.js");
        tracing::debug!(%url, "fetching cart");
        let response = self.http.get(&url).send().await?;
        self.read_json(url, response).await
    }

    async fn change_quantity(&self, id: LineItemId, quantity: u32) -> CoreResult<Cart> {
        let url = self.endpoint("cart/change.js");
        tracing::debug!(%url, id, quantity, "changing cart line");
        let response = self
            .http
            .post(&url)
            .json(&ChangeRequest { id, quantity })
            .send()
            .await?;
        self.read_json(url, response).await
    }
}

#[async_trait]
impl ProductApi for HttpStorefrontClient {
    async fn product(&self, handle: &str) -> CoreResult<Product> {
        let url = self.endpoint(&format!("products/{handle}.js"));
        let response = self.http.get(&url).send().await?;
        self.read_json(url, response).await
    }
}
