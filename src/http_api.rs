use gloo::net::http::Request;
use pixelbattle_core::{decode, ApiError, GridResponse, PixelApi, PlacePixelRequest};

pub(crate) struct BrowserApi {
    endpoint: String,
}

impl BrowserApi {
    pub(crate) fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

fn transport(err: gloo::net::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

impl PixelApi for BrowserApi {
    async fn fetch_grid(&self) -> Result<GridResponse, ApiError> {
        let response = Request::get(&self.endpoint)
            .send()
            .await
            .map_err(transport)?;
        let ok = response.ok();
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !ok {
            return Err(ApiError::rejected(status, &body));
        }
        decode::<GridResponse>(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn place_pixel(&self, request: &PlacePixelRequest) -> Result<(), ApiError> {
        let response = Request::post(&self.endpoint)
            .json(request)
            .map_err(transport)?
            .send()
            .await
            .map_err(transport)?;
        if response.ok() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::rejected(status, &body))
    }
}
