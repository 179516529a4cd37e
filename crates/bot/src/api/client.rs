//! The API gateway client.
//!
//! Owns the single `reqwest::Client` injected at startup and the refresh
//! protocol: a 401 with stored credentials triggers one token refresh and
//! one retry of the original request. A second 401, a missing refresh
//! token, or a failed refresh clears the stored pair and surfaces
//! [`ApiError::Unauthorized`] - never a loop, never a third attempt.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use tandir_core::{CartItemId, CategoryId, ChatId, CredentialPair, Locale, OrderId, ProductId};

use super::error::ApiError;
use super::types::{
    AddToCart, Branch, Cart, Category, CheckoutSubmission, Order, Page, Product, Profile,
    ProfileUpdate, RefreshRequest, RefreshResponse, RegisterRequest, VerifyRequest, VerifyResponse,
};
use crate::session::SessionStore;

/// A successful backend response: decoded JSON body plus the HTTP status.
///
/// 204 and empty-body successes carry an empty JSON object as their
/// success marker.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Authenticated HTTP client for the backend API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    base_url: Url,
    sessions: SessionStore,
}

impl ApiGateway {
    /// Create a gateway over an injected HTTP client.
    ///
    /// `base_url` should end with a slash; one is appended otherwise so
    /// relative endpoint joins behave.
    #[must_use]
    pub fn new(client: reqwest::Client, mut base_url: Url, sessions: SessionStore) -> Self {
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Self {
            inner: Arc::new(GatewayInner {
                client,
                base_url,
                sessions,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Core request path
    // ─────────────────────────────────────────────────────────────────────

    /// Issue an authenticated request, refreshing credentials on a first
    /// 401 and retrying exactly once.
    ///
    /// # Errors
    ///
    /// Returns the tagged [`ApiError`] taxonomy; never panics or raises
    /// transport errors across this boundary.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        identity: ChatId,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, ApiError> {
        let session = self.load_session(identity).await?;
        let locale = session.locale();
        let credentials = session.credentials;

        let first = self
            .execute(
                method.clone(),
                endpoint,
                body,
                query,
                credentials.as_ref().map(CredentialPair::access),
                locale,
            )
            .await;

        let Err(ApiError::Unauthorized { .. }) = &first else {
            return first;
        };

        // 401 without stored credentials: nothing to refresh.
        let Some(credentials) = credentials else {
            return first;
        };

        match self.refresh(identity, &credentials, locale).await {
            Ok(new_access) => {
                tracing::debug!(%identity, %endpoint, "access token refreshed, retrying once");
                let retry = self
                    .execute(method, endpoint, body, query, Some(&new_access), locale)
                    .await;

                if let Err(ApiError::Unauthorized { .. }) = &retry {
                    // Second 401: full logout, never a third attempt.
                    self.forget_credentials(identity).await;
                }
                retry
            }
            Err(e) => {
                tracing::info!(%identity, error = %e, "token refresh failed, clearing credentials");
                self.forget_credentials(identity).await;
                Err(ApiError::Unauthorized {
                    detail: "session expired".to_owned(),
                })
            }
        }
    }

    /// One HTTP round-trip with headers attached; no refresh logic.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
        access: Option<&str>,
        locale: Locale,
    ) -> Result<ApiResponse, ApiError> {
        let url = self
            .inner
            .base_url
            .join(endpoint)
            .map_err(|e| ApiError::Network {
                detail: format!("invalid endpoint {endpoint}: {e}"),
            })?;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json")
            .header("Accept-Language", locale.code());

        if let Some(access) = access {
            request = request.header("Authorization", format!("Bearer {access}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    detail: "backend did not respond".to_owned(),
                }
            } else {
                ApiError::Network {
                    detail: format!("could not reach backend: {e}"),
                }
            }
        })?;

        classify(response).await
    }

    /// Refresh the access token and persist the rotated pair.
    async fn refresh(
        &self,
        identity: ChatId,
        credentials: &CredentialPair,
        locale: Locale,
    ) -> Result<String, ApiError> {
        let body = serde_json::to_value(RefreshRequest {
            refresh: credentials.refresh(),
        })
        .map_err(|e| ApiError::Network {
            detail: e.to_string(),
        })?;

        let value = self
            .execute(
                Method::POST,
                "auth/token/refresh",
                Some(&body),
                &[],
                None,
                locale,
            )
            .await?;

        let response: RefreshResponse = decode(value)?;

        // Persist the new pair so later requests (and restarts) use it.
        let mut session = self.load_session(identity).await?;
        let mut pair = credentials.clone();
        pair.rotate(response.access.clone(), response.refresh);
        session.credentials = Some(pair);
        self.inner
            .sessions
            .save(&session)
            .await
            .map_err(|e| ApiError::Network {
                detail: format!("session store error: {e}"),
            })?;

        Ok(response.access)
    }

    async fn load_session(&self, identity: ChatId) -> Result<crate::session::Session, ApiError> {
        self.inner
            .sessions
            .get(identity)
            .await
            .map_err(|e| ApiError::Network {
                detail: format!("session store error: {e}"),
            })
    }

    async fn forget_credentials(&self, identity: ChatId) {
        if let Err(e) = self.inner.sessions.clear_credentials(identity).await {
            tracing::error!(%identity, error = %e, "failed to clear credentials");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Auth endpoints (hosted by the external credential service)
    // ─────────────────────────────────────────────────────────────────────

    /// Register an identity + phone, triggering OTP delivery.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` for an already-active account or identity
    /// collision; transport-class errors otherwise.
    pub async fn register(
        &self,
        identity: ChatId,
        request: &RegisterRequest,
    ) -> Result<(), ApiError> {
        let body = encode(request)?;
        self.request(Method::POST, "auth/register", identity, Some(&body), &[])
            .await?;
        Ok(())
    }

    /// Submit the verification code, receiving a credential pair.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` for a wrong or expired code.
    pub async fn verify(
        &self,
        identity: ChatId,
        request: &VerifyRequest,
    ) -> Result<VerifyResponse, ApiError> {
        let body = encode(request)?;
        let value = self
            .request(Method::POST, "auth/verify", identity, Some(&body), &[])
            .await?;
        decode(value)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// `ApiError::Unauthorized` once the credential pair is beyond refresh.
    pub async fn profile(&self, identity: ChatId) -> Result<Profile, ApiError> {
        let value = self
            .request(Method::GET, "users/profile", identity, None, &[])
            .await?;
        decode(value)
    }

    /// Push a locale change to the backend profile.
    ///
    /// # Errors
    ///
    /// Same taxonomy as every call; callers treat failure as non-fatal.
    pub async fn update_profile_locale(
        &self,
        identity: ChatId,
        locale: Locale,
    ) -> Result<(), ApiError> {
        let body = encode(&ProfileUpdate {
            language_code: locale.code(),
        })?;
        self.request(Method::PATCH, "users/profile", identity, Some(&body), &[])
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Catalog reads
    // ─────────────────────────────────────────────────────────────────────

    /// List catalog categories.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn categories(&self, identity: ChatId) -> Result<Page<Category>, ApiError> {
        let value = self
            .request(Method::GET, "categories", identity, None, &[])
            .await?;
        decode(value)
    }

    /// List products, optionally filtered by category and search term,
    /// with pagination.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn products(
        &self,
        identity: ChatId,
        category_id: Option<CategoryId>,
        search: Option<&str>,
        page: u32,
    ) -> Result<Page<Product>, ApiError> {
        let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
        if let Some(category_id) = category_id {
            query.push(("category_id", category_id.to_string()));
        }
        if let Some(search) = search {
            query.push(("search", search.to_owned()));
        }

        let value = self
            .request(Method::GET, "products", identity, None, &query)
            .await?;
        decode(value)
    }

    /// List branches with their computed open flag.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn branches(&self, identity: ChatId) -> Result<Vec<Branch>, ApiError> {
        let value = self
            .request(Method::GET, "branches", identity, None, &[])
            .await?;
        decode(value)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cart
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the user's cart.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn cart(&self, identity: ChatId) -> Result<Cart, ApiError> {
        let value = self.request(Method::GET, "cart", identity, None, &[]).await?;
        decode(value)
    }

    /// Add a product to the cart (quantities merge server-side).
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn add_to_cart(
        &self,
        identity: ChatId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = encode(&AddToCart {
            product_id,
            quantity,
        })?;
        let value = self
            .request(Method::POST, "cart", identity, Some(&body), &[])
            .await?;
        decode(value)
    }

    /// Set a cart line's quantity.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn set_cart_quantity(
        &self,
        identity: ChatId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = serde_json::json!({ "quantity": quantity });
        let value = self
            .request(
                Method::PATCH,
                &format!("cart/items/{item_id}"),
                identity,
                Some(&body),
                &[],
            )
            .await?;
        decode(value)
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn remove_cart_item(
        &self,
        identity: ChatId,
        item_id: CartItemId,
    ) -> Result<Cart, ApiError> {
        let value = self
            .request(
                Method::DELETE,
                &format!("cart/items/{item_id}"),
                identity,
                None,
                &[],
            )
            .await?;
        decode(value)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────

    /// Submit checkout.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` for an empty cart, unavailable products, a
    /// closed branch, or incomplete fulfillment fields.
    pub async fn checkout(
        &self,
        identity: ChatId,
        submission: &CheckoutSubmission,
    ) -> Result<Order, ApiError> {
        let body = encode(submission)?;
        let value = self
            .request(Method::POST, "orders/checkout", identity, Some(&body), &[])
            .await?;
        decode(value)
    }

    /// One page of order history.
    ///
    /// # Errors
    ///
    /// Standard taxonomy.
    pub async fn order_history(&self, identity: ChatId, page: u32) -> Result<Page<Order>, ApiError> {
        let query = [("page", page.to_string())];
        let value = self
            .request(Method::GET, "orders/history", identity, None, &query)
            .await?;
        decode(value)
    }

    /// Order detail.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` if the order is gone or not the caller's.
    pub async fn order_detail(
        &self,
        identity: ChatId,
        order_id: OrderId,
    ) -> Result<Order, ApiError> {
        let value = self
            .request(
                Method::GET,
                &format!("orders/{order_id}"),
                identity,
                None,
                &[],
            )
            .await?;
        decode(value)
    }

    /// Request cancellation of an order.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` once the order is delivered or cancelled.
    pub async fn cancel_order(
        &self,
        identity: ChatId,
        order_id: OrderId,
    ) -> Result<Order, ApiError> {
        let value = self
            .request(
                Method::POST,
                &format!("orders/{order_id}/cancel"),
                identity,
                None,
                &[],
            )
            .await?;
        decode(value)
    }
}

/// Map an HTTP response to the tagged taxonomy.
async fn classify(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
    let status = response.status();

    if status == StatusCode::NO_CONTENT {
        return Ok(ApiResponse {
            status: status.as_u16(),
            body: Value::Object(serde_json::Map::new()),
        });
    }

    let text = response.text().await.unwrap_or_default();

    if status.is_success() {
        let body = if text.is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&text).map_err(|_| ApiError::Server {
                detail: "invalid response format".to_owned(),
                status: status.as_u16(),
            })?
        };
        return Ok(ApiResponse {
            status: status.as_u16(),
            body,
        });
    }

    let detail = extract_detail(&text, status);
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized { detail }),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound { detail }),
        s if s.is_client_error() => Err(ApiError::Validation {
            detail,
            status: s.as_u16(),
        }),
        s => Err(ApiError::Server {
            detail,
            status: s.as_u16(),
        }),
    }
}

/// Pull the human-readable detail out of an error body.
fn extract_detail(text: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        for key in ["detail", "error", "message"] {
            if let Some(detail) = value.get(key).and_then(Value::as_str) {
                return detail.to_owned();
            }
        }
    }
    if text.is_empty() {
        format!("HTTP {status}")
    } else {
        text.chars().take(200).collect()
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Network {
        detail: format!("failed to encode request: {e}"),
    })
}

fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ApiError> {
    serde_json::from_value(response.body).map_err(|_| ApiError::Server {
        detail: "invalid response format".to_owned(),
        status: response.status,
    })
}
