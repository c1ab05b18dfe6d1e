use crate::cache::RecordSource;
use crate::models::{MenuItem, MenuQuery};
use crate::reconcile::DiffPayload;
use crate::state::PayloadTransport;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_API_URL: &str = "http://localhost:8888";
pub const API_URL_VARS: &[&str] = &["NAVMENU_API_URL", "API_URL"];
pub const API_TOKEN_VAR: &str = "NAVMENU_API_TOKEN";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    /// Site root from the environment (`NAVMENU_API_URL`, then `API_URL`).
    pub fn new() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        for var in API_URL_VARS {
            if let Some(url) = lookup(*var).filter(|s| !s.trim().is_empty()) {
                return Self {
                    api_url: url.trim_end_matches('/').to_string(),
                };
            }
        }

        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

const REST_PREFIX: &str = "/wp-json";
const MENU_ITEMS_PATH: &str = "/__experimental/menu-items";
const SAVE_NONCE_PATH: &str = "/__experimental/customizer-nonces/get-save-nonce";
const ADMIN_AJAX_PATH: &str = "/wp-admin/admin-ajax.php";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveNonce {
    pub nonce: String,
    pub stylesheet: String,
}

/// Body for creating a menu item through the REST collection.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateMenuItemRequest {
    pub title: String,
    pub url: String,
    pub menus: u64,
    pub parent: u64,
    pub menu_order: u32,
}

/// `admin-ajax.php` answer to `customize_save`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        let mut client = Self::new(EnvConfig::new().api_url);
        if let Some(token) = std::env::var(API_TOKEN_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
        {
            client.set_token(token);
        }
        client
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    fn with_auth_headers(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }
        req
    }

    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}{REST_PREFIX}{path}", self.base_url)
    }

    pub(crate) fn menu_items_url(&self, query: &MenuQuery) -> String {
        let menus = query.menus.to_string();
        let per_page = query.per_page.to_string();
        format!(
            "{}?menus={}&per_page={}",
            self.rest_url(MENU_ITEMS_PATH),
            urlencoding::encode(&menus),
            urlencoding::encode(&per_page)
        )
    }

    async fn read_response<T: serde::de::DeserializeOwned>(
        res: reqwest::Response,
        ctx: &str,
    ) -> ApiResult<T> {
        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> ApiResult<T> {
        let req = self.with_auth_headers(self.http.get(url));
        let res = req.send().await.map_err(ApiError::network)?;
        Self::read_response(res, "Request failed").await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let req = self.with_auth_headers(self.http.post(url)).json(body);
        let res = req.send().await.map_err(ApiError::network)?;
        Self::read_response(res, "Request failed").await
    }

    pub async fn get_menu_items(&self, query: &MenuQuery) -> ApiResult<Vec<MenuItem>> {
        let data: serde_json::Value = self.get_json(self.menu_items_url(query)).await?;
        Self::parse_menu_item_list_response(data)
    }

    pub async fn create_menu_item(&self, req_body: &CreateMenuItemRequest) -> ApiResult<MenuItem> {
        self.post_json(self.rest_url(MENU_ITEMS_PATH), req_body).await
    }

    pub async fn get_save_nonce(&self) -> ApiResult<SaveNonce> {
        self.get_json(self.rest_url(SAVE_NONCE_PATH)).await
    }

    /// Publish the whole menu through the customizer in one changeset.
    pub async fn batch_save(&self, payload: &DiffPayload) -> ApiResult<SaveResponse> {
        let SaveNonce { nonce, stylesheet } = self.get_save_nonce().await?;
        let customized = payload.to_json_string().map_err(ApiError::parse)?;
        let form = Self::customize_save_form(&nonce, &stylesheet, &new_changeset_uuid(), customized);

        let url = format!("{}{ADMIN_AJAX_PATH}", self.base_url);
        let req = self.with_auth_headers(self.http.post(url)).form(&form);
        let res = req.send().await.map_err(ApiError::network)?;
        Self::read_response(res, "Customize save failed").await
    }

    pub(crate) fn customize_save_form(
        nonce: &str,
        stylesheet: &str,
        changeset_uuid: &str,
        customized: String,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("wp_customize", "on".to_string()),
            ("customize_theme", stylesheet.to_string()),
            ("nonce", nonce.to_string()),
            ("customize_changeset_uuid", changeset_uuid.to_string()),
            ("customize_autosaved", "on".to_string()),
            ("customize_changeset_status", "publish".to_string()),
            ("action", "customize_save".to_string()),
            ("customized", customized),
        ]
    }

    /// The collection normally answers with a bare array; some proxies wrap it.
    pub(crate) fn parse_menu_item_list_response(data: serde_json::Value) -> ApiResult<Vec<MenuItem>> {
        let list = match data {
            serde_json::Value::Array(list) => list,
            serde_json::Value::Object(mut obj) => match obj.remove("items") {
                Some(serde_json::Value::Array(list)) => list,
                _ => return Err(ApiError::parse("menu items response is not a list")),
            },
            _ => return Err(ApiError::parse("menu items response is not a list")),
        };

        let mut out: Vec<MenuItem> = Vec::with_capacity(list.len());
        for item in list {
            match serde_json::from_value::<MenuItem>(item) {
                Ok(menu_item) => out.push(menu_item),
                Err(e) => tracing::warn!(error = %e, "skipping malformed menu item"),
            }
        }
        Ok(out)
    }
}

/// Fresh changeset id per save.
fn new_changeset_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl RecordSource for ApiClient {
    async fn fetch_records(&self, query: &MenuQuery) -> ApiResult<Vec<MenuItem>> {
        self.get_menu_items(query).await
    }
}

impl PayloadTransport for ApiClient {
    async fn submit(&self, _query: &MenuQuery, payload: &DiffPayload) -> ApiResult<SaveResponse> {
        self.batch_save(payload).await
    }
}
