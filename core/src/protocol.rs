use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::grid::CellCoord;

/// Messages the client sends over the broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Register { client_id: String },
}

/// Messages the authority broadcasts. Tags the client does not know decode
/// to `Unknown` so they can be logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMsg {
    RegisterConfirm(RegisterConfirm),
    PixelUpdate(PixelUpdate),
    UserCount(UserCount),
    Unknown(String),
}

impl ServerMsg {
    pub fn tag(&self) -> &str {
        match self {
            ServerMsg::RegisterConfirm(_) => "register_confirm",
            ServerMsg::PixelUpdate(_) => "pixel_update",
            ServerMsg::UserCount(_) => "user_count",
            ServerMsg::Unknown(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfirm {
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelUpdate {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

impl PixelUpdate {
    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    pub count: u64,
}

/// A user's request to color one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteIntent {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

impl WriteIntent {
    pub fn new(coord: CellCoord, color: Color) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            color,
        }
    }

    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    pub fn into_update(self) -> PixelUpdate {
        PixelUpdate {
            x: self.x,
            y: self.y,
            color: self.color,
        }
    }
}

/// Body of `POST /api/pixel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacePixelRequest {
    pub x: u32,
    pub y: u32,
    pub color: Color,
    pub client_id: String,
}

impl PlacePixelRequest {
    pub fn new(intent: &WriteIntent, client_id: &str) -> Self {
        Self {
            x: intent.x,
            y: intent.y,
            color: intent.color.clone(),
            client_id: client_id.to_string(),
        }
    }
}

/// Body of `GET /api/pixel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridResponse {
    #[serde(default)]
    pub grid: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceAck {
    #[serde(default)]
    pub success: bool,
}
