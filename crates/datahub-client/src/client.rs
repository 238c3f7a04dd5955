//! HTTP wrapper around the DataHub order endpoints.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{ClientError, ClientResult};
use crate::models::{
    FileDetails, FileDetailsResponse, OrderDetails, OrderDetailsResponse, OrderList, RunList,
    RunListForModel,
};

/// Production API host.
pub const DOMAIN: &str = "api-metoffice.apiconnect.ibmcloud.com";
const ROOT: &str = "metoffice/production/1.0.0";

const CLIENT_ID_HEADER: &str = "X-IBM-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-IBM-Client-Secret";
const GRIB_CONTENT_TYPE: &str = "application/x-grib";

/// Client for the Weather DataHub REST API.
///
/// Every request carries the IBM client id/secret headers; manifest requests
/// ask for `detail=MINIMAL` to keep response bodies small.
pub struct DataHubClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl DataHubClient {
    /// Client against the production endpoint.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> ClientResult<Self> {
        Self::with_base_url(api_key, api_secret, format!("https://{}/{}", DOMAIN, ROOT))
    }

    /// Client against an explicit base URL (local mock servers in tests).
    pub fn with_base_url(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/{}", self.base_url, path))
            .header(CLIENT_ID_HEADER, &self.api_key)
            .header(CLIENT_SECRET_HEADER, &self.api_secret)
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Http { status, body })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        debug!(path, "GET");
        let response = self.get(path).query(query).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// List the orders on the account.
    #[instrument(skip(self))]
    pub async fn get_orders(&self) -> ClientResult<OrderList> {
        self.get_json("orders", &[]).await
    }

    /// Latest file manifest for one order.
    #[instrument(skip(self))]
    pub async fn get_latest_order(&self, order_id: &str) -> ClientResult<OrderDetails> {
        let response: OrderDetailsResponse = self
            .get_json(
                &format!("orders/{}/latest", order_id),
                &[("detail", "MINIMAL")],
            )
            .await?;
        Ok(response.order_details)
    }

    /// Parameter extents for one file in an order.
    #[instrument(skip(self))]
    pub async fn get_file_details(
        &self,
        order_id: &str,
        file_id: &str,
    ) -> ClientResult<FileDetails> {
        let response: FileDetailsResponse = self
            .get_json(
                &format!("orders/{}/latest/{}", order_id, file_id),
                &[("detail", "MINIMAL")],
            )
            .await?;
        Ok(response.file_details)
    }

    /// Completed runs across all models.
    #[instrument(skip(self))]
    pub async fn get_runs(&self) -> ClientResult<RunList> {
        self.get_json("runs", &[]).await
    }

    /// Completed runs for one model.
    #[instrument(skip(self))]
    pub async fn get_runs_for_model(&self, model_id: &str) -> ClientResult<RunListForModel> {
        self.get_json(&format!("runs/{}", model_id), &[]).await
    }

    /// Download the GRIB payload of one manifest file.
    #[instrument(skip(self))]
    pub async fn download(&self, order_id: &str, file_id: &str) -> ClientResult<Bytes> {
        let path = format!("orders/{}/latest/{}/data", order_id, file_id);
        debug!(path, "GET");
        let response = self
            .get(&path)
            .header(header::ACCEPT, GRIB_CONTENT_TYPE)
            .send()
            .await?;
        Ok(Self::check(response).await?.bytes().await?)
    }
}
