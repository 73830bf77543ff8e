use url::Url;

pub(crate) const API_PATH: &str = "/api/pixel";
pub(crate) const WS_PATH: &str = "/ws";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Endpoints {
    pub(crate) api: Url,
    pub(crate) ws: Url,
}

/// Derives both endpoints from one base URL. Either an `http(s)` or a
/// `ws(s)` base is accepted; the scheme is swapped for the other endpoint.
pub(crate) fn endpoints_for(base: &str) -> Option<Endpoints> {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        return None;
    }
    let http = Url::parse(&normalize_http_base(trimmed)).ok()?;
    let ws = Url::parse(&normalize_ws_base(trimmed)).ok()?;
    Some(Endpoints {
        api: with_path(http, API_PATH),
        ws: with_path(ws, WS_PATH),
    })
}

pub(crate) fn build_time_base() -> Option<&'static str> {
    option_env!("PIXELBATTLE_BASE_URL")
        .map(str::trim)
        .filter(|base| !base.is_empty())
}

/// Build-time override first, then the page's own origin.
#[cfg(target_arch = "wasm32")]
pub(crate) fn load_endpoints() -> Option<Endpoints> {
    if let Some(base) = build_time_base() {
        return endpoints_for(base);
    }
    let window = web_sys::window()?;
    let origin = window.location().origin().ok()?;
    endpoints_for(&origin)
}

fn with_path(mut url: Url, suffix: &str) -> Url {
    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base_path}{suffix}"));
    url.set_query(None);
    url.set_fragment(None);
    url
}

fn normalize_ws_base(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = raw.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        raw.to_string()
    }
}

fn normalize_http_base(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("ws://") {
        format!("http://{rest}")
    } else if let Some(rest) = raw.strip_prefix("wss://") {
        format!("https://{rest}")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_origin() {
        let endpoints = endpoints_for("http://localhost:8000").unwrap();
        assert_eq!(endpoints.api.as_str(), "http://localhost:8000/api/pixel");
        assert_eq!(endpoints.ws.as_str(), "ws://localhost:8000/ws");
    }

    #[test]
    fn secure_base_with_path() {
        let endpoints = endpoints_for(" https://example.com/battle/?debug=1 ").unwrap();
        assert_eq!(endpoints.api.as_str(), "https://example.com/battle/api/pixel");
        assert_eq!(endpoints.ws.as_str(), "wss://example.com/battle/ws");
    }

    #[test]
    fn websocket_base_maps_back_to_http() {
        let endpoints = endpoints_for("wss://example.com").unwrap();
        assert_eq!(endpoints.api.as_str(), "https://example.com/api/pixel");
        assert_eq!(endpoints.ws.as_str(), "wss://example.com/ws");
    }

    #[test]
    fn blank_or_invalid_base() {
        assert_eq!(endpoints_for("   "), None);
        assert_eq!(endpoints_for("not a url"), None);
    }
}
