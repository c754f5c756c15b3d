//! Storefront API transport.
//!
//! [`StoreApi`] is what the mirrors talk to; [`HttpStoreApi`] implements it
//! over HTTP with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use ziva_core::{CheckoutRequest, ClientId, OrderId, OrderStatus, ProductId};

use crate::error::{ClientError, ClientResult};
use crate::types::{CartItem, ErrorBody, OrderCreated, OrderView, WishlistItem};

/// Request timeout for every API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cart, wishlist and checkout operations used by the mirrors.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// Fetch the client's cart lines.
    async fn cart(&self, client_id: &ClientId) -> ClientResult<Vec<CartItem>>;

    /// Add units of a product to the cart.
    async fn add_to_cart(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> ClientResult<CartItem>;

    /// Overwrite a cart line's quantity.
    async fn update_cart_item(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> ClientResult<CartItem>;

    /// Remove a product from the cart.
    async fn remove_from_cart(&self, client_id: &ClientId, product_id: ProductId)
    -> ClientResult<()>;

    /// Empty the cart.
    async fn clear_cart(&self, client_id: &ClientId) -> ClientResult<()>;

    /// Fetch the client's wishlist.
    async fn wishlist(&self, client_id: &ClientId) -> ClientResult<Vec<WishlistItem>>;

    /// Like a product.
    async fn add_to_wishlist(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<WishlistItem>;

    /// Unlike a product.
    async fn remove_from_wishlist(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<()>;

    /// Place an order.
    async fn create_order(&self, request: &CheckoutRequest) -> ClientResult<OrderId>;
}

/// HTTP implementation of [`StoreApi`] plus the order endpoints.
#[derive(Debug, Clone)]
pub struct HttpStoreApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStoreApi {
    /// Create a client for the storefront at `base_url`
    /// (e.g. `http://localhost:3000`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.base_url.join(path)?;
        Ok(self.client.request(method, url))
    }

    fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    /// Turn non-2xx responses into [`ClientError::Api`] using the server's
    /// `{"error": ...}` body when present.
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        tracing::debug!(status = status.as_u16(), %message, "Storefront API error");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<T> {
        let url = self.url_with_query(path, query)?;
        let response = self.client.get(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.request(method, path)?.json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Fetch one of the client's orders.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the order doesn't exist
    /// or belongs to another client.
    pub async fn order(&self, client_id: &ClientId, order_id: OrderId) -> ClientResult<OrderView> {
        let order_id = order_id.to_string();
        self.get(
            "/api/order",
            &[("clientId", client_id.as_str()), ("orderId", &order_id)],
        )
        .await
    }

    /// List the client's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self, client_id: &ClientId) -> ClientResult<Vec<OrderView>> {
        self.get("/api/orders", &[("clientId", client_id.as_str())])
            .await
    }

    /// Move one of the client's orders to `status`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 409 if the transition isn't
    /// allowed.
    pub async fn update_order_status(
        &self,
        client_id: &ClientId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> ClientResult<OrderView> {
        self.send_json(
            Method::PUT,
            "/api/order",
            &json!({ "clientId": client_id, "orderId": order_id, "status": status }),
        )
        .await
    }

    /// Delete one of the client's orders.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the order doesn't exist
    /// or belongs to another client.
    pub async fn delete_order(&self, client_id: &ClientId, order_id: OrderId) -> ClientResult<()> {
        let _: serde_json::Value = self
            .send_json(
                Method::DELETE,
                "/api/order",
                &json!({ "clientId": client_id, "orderId": order_id }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StoreApi for HttpStoreApi {
    async fn cart(&self, client_id: &ClientId) -> ClientResult<Vec<CartItem>> {
        self.get("/api/cart", &[("clientId", client_id.as_str())])
            .await
    }

    async fn add_to_cart(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> ClientResult<CartItem> {
        self.send_json(
            Method::POST,
            "/api/cart",
            &json!({ "clientId": client_id, "productId": product_id, "quantity": quantity }),
        )
        .await
    }

    async fn update_cart_item(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> ClientResult<CartItem> {
        self.send_json(
            Method::PUT,
            "/api/cart",
            &json!({ "clientId": client_id, "productId": product_id, "quantity": quantity }),
        )
        .await
    }

    async fn remove_from_cart(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<()> {
        let _: serde_json::Value = self
            .send_json(
                Method::DELETE,
                "/api/cart",
                &json!({ "clientId": client_id, "productId": product_id }),
            )
            .await?;
        Ok(())
    }

    async fn clear_cart(&self, client_id: &ClientId) -> ClientResult<()> {
        let _: serde_json::Value = self
            .send_json(
                Method::DELETE,
                "/api/cart/clear",
                &json!({ "clientId": client_id }),
            )
            .await?;
        Ok(())
    }

    async fn wishlist(&self, client_id: &ClientId) -> ClientResult<Vec<WishlistItem>> {
        self.get("/api/wishlist", &[("clientId", client_id.as_str())])
            .await
    }

    async fn add_to_wishlist(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<WishlistItem> {
        self.send_json(
            Method::POST,
            "/api/wishlist",
            &json!({ "clientId": client_id, "productId": product_id }),
        )
        .await
    }

    async fn remove_from_wishlist(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<()> {
        let _: serde_json::Value = self
            .send_json(
                Method::DELETE,
                "/api/wishlist",
                &json!({ "clientId": client_id, "productId": product_id }),
            )
            .await?;
        Ok(())
    }

    async fn create_order(&self, request: &CheckoutRequest) -> ClientResult<OrderId> {
        let created: OrderCreated = self.send_json(Method::POST, "/api/order", request).await?;
        Ok(created.order_id)
    }
}
