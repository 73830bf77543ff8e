use pixelbattle_core::codec::decode;
use pixelbattle_core::{ApiError, GridResponse, PixelApi, PlacePixelRequest};
use url::Url;

/// `GET`/`POST /api/pixel` over reqwest.
pub struct HttpApi {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpApi {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

impl PixelApi for HttpApi {
    async fn fetch_grid(&self) -> Result<GridResponse, ApiError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::rejected(status.as_u16(), &body));
        }
        decode::<GridResponse>(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn place_pixel(&self, request: &PlacePixelRequest) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::rejected(status.as_u16(), &body))
    }
}
