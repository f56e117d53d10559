use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, ensure};
use url::Url;

use crate::error::{
    ApiResult, BuildClientSnafu, DecodeSnafu, InvalidBaseUrlSnafu, StatusSnafu,
    TransportSnafu, UnauthorizedSnafu,
};
use crate::message::{Message, NewMessage};
use crate::query::ListQuery;
use crate::store::{BoxFuture, MessageStore};

pub const MESSAGES_PATH: &str = "/api/v1/messages";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub token: String,
    pub request_timeout: Option<Duration>,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            token: token.into().trim().to_string(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// `MessageStore` over the REST endpoint, authenticated with a static bearer token.
pub struct HttpMessageStore {
    client: reqwest::Client,
    messages_url: Url,
    token: String,
}

impl HttpMessageStore {
    pub fn new(config: StoreConfig) -> ApiResult<Self> {
        // Plain concatenation keeps any path prefix on the base URL intact.
        let raw = format!("{}{}", config.base_url.trim_end_matches('/'), MESSAGES_PATH);
        let messages_url = Url::parse(&raw).context(InvalidBaseUrlSnafu {
            stage: "parse-messages-url",
            raw: raw.clone(),
        })?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(BuildClientSnafu {
            stage: "build-http-client",
        })?;

        Ok(Self {
            client,
            messages_url,
            token: config.token,
        })
    }

    pub fn messages_url(&self) -> &Url {
        &self.messages_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", self.token))
    }

    async fn send_json<T>(&self, request: RequestBuilder, stage: &'static str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .authorized(request)
            .send()
            .await
            .context(TransportSnafu { stage })?;
        let response = Self::check_status(response, stage)?;
        response.json::<T>().await.context(DecodeSnafu { stage })
    }

    fn check_status(response: Response, stage: &'static str) -> ApiResult<Response> {
        let status = response.status();
        ensure!(status != StatusCode::UNAUTHORIZED, UnauthorizedSnafu { stage });
        ensure!(
            status.is_success(),
            StatusSnafu {
                stage,
                status: status.as_u16(),
            }
        );
        Ok(response)
    }

    async fn fetch_messages(&self, query: ListQuery) -> ApiResult<Vec<Message>> {
        let mut request = self.client.get(self.messages_url.clone());
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }

        let messages: Vec<Message> = self.send_json(request, "list-messages").await?;
        tracing::trace!(
            count = messages.len(),
            after = ?query.after,
            "fetched messages from store"
        );
        Ok(messages)
    }

    async fn post_message(&self, draft: NewMessage) -> ApiResult<Message> {
        let request = self.client.post(self.messages_url.clone()).json(&draft);
        let created: Message = self.send_json(request, "create-message").await?;
        tracing::trace!(id = %created.id, "store confirmed message");
        Ok(created)
    }
}

impl MessageStore for HttpMessageStore {
    fn list<'a>(&'a self, query: ListQuery) -> BoxFuture<'a, ApiResult<Vec<Message>>> {
        Box::pin(self.fetch_messages(query))
    }

    fn create<'a>(&'a self, draft: NewMessage) -> BoxFuture<'a, ApiResult<Message>> {
        Box::pin(self.post_message(draft))
    }
}

impl std::fmt::Debug for HttpMessageStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpMessageStore")
            .field("messages_url", &self.messages_url.as_str())
            .finish_non_exhaustive()
    }
}
