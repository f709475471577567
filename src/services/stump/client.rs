//! Stump GraphQL client
//!
//! Every query and mutation goes through [StumpClient::execute]: the request is
//! POSTed to `<base>/api/graphql` with the auth headers attached, and the
//! response envelope is checked for GraphQL errors before `data` is decoded.
//! Covers are plain GETs against the v2 REST thumbnail routes.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::auth::StumpAuthProvider;
use super::model::{
    StumpLibrary, StumpLibraryId, StumpMedia, StumpMediaId, StumpMediaWithSeries, StumpPage,
    StumpPaginationInfo, StumpSeries, StumpSeriesId,
};
use super::queries;
use super::request::{
    GraphQlRequest, StumpMediaMetadataInput, StumpSeriesMetadataInput, decode_envelope,
};
use crate::error::{Result, StumpError};
use crate::mediaserver::Image;
use crate::services::rate_limiter::WriteRateLimiter;

pub const DEFAULT_PAGE: i32 = 1;
pub const DEFAULT_PAGE_SIZE: i32 = 500;

const GRAPHQL_PATH: &str = "api/graphql";

#[derive(Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
struct PagedNodes<T> {
    nodes: Vec<T>,
    #[serde(rename = "pageInfo", default)]
    page_info: Option<StumpPaginationInfo>,
}

#[derive(Deserialize)]
struct LibrariesResponse {
    libraries: Nodes<StumpLibrary>,
}

#[derive(Deserialize)]
struct LibraryByIdResponse {
    #[serde(rename = "libraryById")]
    library: Option<StumpLibrary>,
}

#[derive(Deserialize)]
struct SeriesPageResponse {
    series: PagedNodes<StumpSeries>,
}

#[derive(Deserialize)]
struct AllSeriesResponse {
    series: Nodes<StumpSeries>,
}

#[derive(Deserialize)]
struct SeriesByIdResponse {
    #[serde(rename = "seriesById")]
    series: Option<StumpSeries>,
}

#[derive(Deserialize)]
struct MediaPageResponse {
    media: PagedNodes<StumpMedia>,
}

#[derive(Deserialize)]
struct AllMediaResponse {
    media: Nodes<StumpMedia>,
}

#[derive(Deserialize)]
struct MediaByIdResponse<T> {
    #[serde(rename = "mediaById")]
    media: Option<T>,
}

#[derive(Deserialize)]
struct ScanSeriesResponse {
    #[serde(rename = "scanSeries")]
    scan_series: bool,
}

fn unpaginated() -> Value {
    json!({ "none": { "unpaginated": true } })
}

fn offset(page: i32, page_size: i32) -> Value {
    json!({ "offset": { "page": page, "pageSize": page_size } })
}

/// Stump server client
pub struct StumpClient {
    http: Client,
    base_url: Url,
    auth: Arc<dyn StumpAuthProvider>,
    limiter: WriteRateLimiter,
}

impl StumpClient {
    pub fn new(
        base_url: &str,
        auth: Arc<dyn StumpAuthProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("stump-mediaserver/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(http, base_url, auth)
    }

    pub fn with_http_client(
        http: Client,
        base_url: &str,
        auth: Arc<dyn StumpAuthProvider>,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(StumpError::Config(format!(
                "unsupported Stump URL scheme: {}",
                base_url.scheme()
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            auth,
            limiter: WriteRateLimiter::for_stump_updates(),
        })
    }

    /// Replace the write limiter, e.g. to share one across clients.
    pub fn with_rate_limiter(mut self, limiter: WriteRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth_headers(&self) -> HeaderMap {
        self.auth.auth_headers()
    }

    pub fn graphql_url(&self) -> Result<Url> {
        Ok(self.base_url.join(GRAPHQL_PATH)?)
    }

    /// Websocket endpoint of the GraphQL subscriptions (same host and path).
    pub fn subscription_url(&self) -> Result<Url> {
        let mut url = self.graphql_url()?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| StumpError::Config(format!("cannot derive websocket url from {url}")))?;
        Ok(url)
    }

    /// Run one query or mutation and decode its `data` into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .http
            .post(self.graphql_url()?)
            .headers(self.auth.auth_headers())
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StumpError::Status { status });
        }

        let body = response.bytes().await?;
        decode_envelope(&body)
    }

    pub async fn get_libraries(&self) -> Result<Vec<StumpLibrary>> {
        let response: LibrariesResponse = self
            .execute(&queries::get_libraries(), json!({ "pagination": unpaginated() }))
            .await?;
        debug!(count = response.libraries.nodes.len(), "Fetched Stump libraries");
        Ok(response.libraries.nodes)
    }

    pub async fn get_library(&self, library_id: &StumpLibraryId) -> Result<StumpLibrary> {
        let response: LibraryByIdResponse = self
            .execute(&queries::get_library(), json!({ "id": library_id }))
            .await?;
        response
            .library
            .ok_or_else(|| StumpError::NotFound(format!("library {library_id}")))
    }

    pub async fn scan_library(&self, library_id: &StumpLibraryId) -> Result<()> {
        let _: Value = self
            .execute(queries::SCAN_LIBRARY, json!({ "id": library_id }))
            .await?;
        Ok(())
    }

    pub async fn get_series_page(
        &self,
        library_id: &StumpLibraryId,
        page: i32,
        page_size: i32,
    ) -> Result<StumpPage<StumpSeries>> {
        let variables = json!({
            "filter": { "libraryId": { "eq": library_id } },
            "pagination": offset(page, page_size),
        });
        let response: SeriesPageResponse =
            self.execute(&queries::get_series_page(), variables).await?;
        Ok(StumpPage::from_nodes(
            response.series.nodes,
            response.series.page_info,
            page,
            page_size,
        ))
    }

    /// Every series of a library in one unpaginated request.
    pub async fn get_all_series(&self, library_id: &StumpLibraryId) -> Result<Vec<StumpSeries>> {
        let variables = json!({
            "filter": { "libraryId": { "eq": library_id } },
            "pagination": unpaginated(),
        });
        let response: AllSeriesResponse =
            self.execute(&queries::get_all_series(), variables).await?;
        Ok(response.series.nodes)
    }

    pub async fn get_series(&self, series_id: &StumpSeriesId) -> Result<StumpSeries> {
        let response: SeriesByIdResponse = self
            .execute(&queries::get_series_detail(), json!({ "id": series_id }))
            .await?;
        response
            .series
            .ok_or_else(|| StumpError::NotFound(format!("series {series_id}")))
    }

    pub async fn update_series_metadata(
        &self,
        series_id: &StumpSeriesId,
        metadata: &StumpSeriesMetadataInput,
    ) -> Result<()> {
        self.limiter.wait_for_permit().await;
        let _: Value = self
            .execute(
                queries::UPDATE_SERIES_METADATA,
                json!({ "id": series_id, "input": metadata }),
            )
            .await?;
        Ok(())
    }

    pub async fn scan_series(&self, series_id: &StumpSeriesId) -> Result<bool> {
        let response: ScanSeriesResponse = self
            .execute(queries::SCAN_SERIES, json!({ "id": series_id }))
            .await?;
        Ok(response.scan_series)
    }

    pub async fn get_media_page(
        &self,
        series_id: &StumpSeriesId,
        page: i32,
        page_size: i32,
    ) -> Result<StumpPage<StumpMedia>> {
        let variables = json!({
            "filter": { "seriesId": { "eq": series_id } },
            "pagination": offset(page, page_size),
        });
        let response: MediaPageResponse =
            self.execute(&queries::get_media_page(), variables).await?;
        Ok(StumpPage::from_nodes(
            response.media.nodes,
            response.media.page_info,
            page,
            page_size,
        ))
    }

    pub async fn get_all_media(&self, series_id: &StumpSeriesId) -> Result<Vec<StumpMedia>> {
        let variables = json!({
            "filter": { "seriesId": { "eq": series_id } },
            "pagination": unpaginated(),
        });
        let response: AllMediaResponse = self.execute(&queries::get_all_media(), variables).await?;
        Ok(response.media.nodes)
    }

    pub async fn get_media(&self, media_id: &StumpMediaId) -> Result<StumpMedia> {
        let response: MediaByIdResponse<StumpMedia> = self
            .execute(&queries::get_media_detail(), json!({ "id": media_id }))
            .await?;
        response
            .media
            .ok_or_else(|| StumpError::NotFound(format!("media {media_id}")))
    }

    pub async fn get_media_with_series(
        &self,
        media_id: &StumpMediaId,
    ) -> Result<StumpMediaWithSeries> {
        let response: MediaByIdResponse<StumpMediaWithSeries> = self
            .execute(&queries::get_media_with_series(), json!({ "id": media_id }))
            .await?;
        response
            .media
            .ok_or_else(|| StumpError::NotFound(format!("media {media_id}")))
    }

    pub async fn update_media_metadata(
        &self,
        media_id: &StumpMediaId,
        metadata: &StumpMediaMetadataInput,
    ) -> Result<()> {
        self.limiter.wait_for_permit().await;
        let _: Value = self
            .execute(
                queries::UPDATE_MEDIA_METADATA,
                json!({ "id": media_id, "input": metadata }),
            )
            .await?;
        Ok(())
    }

    pub async fn get_series_cover(&self, series_id: &StumpSeriesId) -> Result<Image> {
        self.get_image(&format!("api/v2/series/{series_id}/thumbnail"), || {
            format!("series cover {series_id}")
        })
        .await
    }

    pub async fn get_media_cover(&self, media_id: &StumpMediaId) -> Result<Image> {
        self.get_image(&format!("api/v2/media/{media_id}/thumbnail"), || {
            format!("media cover {media_id}")
        })
        .await
    }

    pub async fn upload_series_cover(&self, series_id: &StumpSeriesId, cover: &Image) -> Result<()> {
        self.limiter.wait_for_permit().await;
        let _: Value = self
            .execute(
                queries::UPLOAD_SERIES_COVER,
                json!({ "id": series_id, "image": BASE64.encode(&cover.bytes) }),
            )
            .await?;
        Ok(())
    }

    pub async fn upload_media_cover(&self, media_id: &StumpMediaId, cover: &Image) -> Result<()> {
        self.limiter.wait_for_permit().await;
        let _: Value = self
            .execute(
                queries::UPLOAD_MEDIA_COVER,
                json!({ "id": media_id, "image": BASE64.encode(&cover.bytes) }),
            )
            .await?;
        Ok(())
    }

    async fn get_image(&self, path: &str, describe: impl FnOnce() -> String) -> Result<Image> {
        let response = self
            .http
            .get(self.base_url.join(path)?)
            .headers(self.auth.auth_headers())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StumpError::NotFound(describe()));
        }
        if !status.is_success() {
            return Err(StumpError::Status { status });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(Image { bytes, mime_type })
    }
}

impl std::fmt::Debug for StumpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StumpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stump::auth::ApiKeyAuthProvider;

    fn client(url: &str) -> Result<StumpClient> {
        let auth = Arc::new(ApiKeyAuthProvider::new("key")?);
        StumpClient::new(url, auth, Duration::from_secs(5))
    }

    #[test]
    fn test_graphql_url_keeps_base_path() {
        let client = client("http://stump.local:10801/stump").unwrap();
        assert_eq!(
            client.graphql_url().unwrap().as_str(),
            "http://stump.local:10801/stump/api/graphql"
        );
    }

    #[test]
    fn test_subscription_url_switches_scheme() {
        let plain = client("http://stump.local:10801").unwrap();
        assert_eq!(
            plain.subscription_url().unwrap().as_str(),
            "ws://stump.local:10801/api/graphql"
        );

        let tls = client("https://stump.example.com/").unwrap();
        assert_eq!(
            tls.subscription_url().unwrap().as_str(),
            "wss://stump.example.com/api/graphql"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(client("ftp://stump.local").is_err());
        assert!(client("not a url").is_err());
    }
}
