use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::protocol::{ClientMsg, ServerMsg};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field `{0}` in {1} message")]
    MissingData(&'static str, String),
}

pub fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

pub fn encode_client(msg: &ClientMsg) -> Result<String, CodecError> {
    encode(msg)
}

pub fn decode_client(text: &str) -> Result<ClientMsg, CodecError> {
    decode(text)
}

/// Decodes a broadcast frame. The tag is read first so that unknown tags
/// survive while known tags with a bad payload are reported.
pub fn decode_server(text: &str) -> Result<ServerMsg, CodecError> {
    let Envelope { kind, data } = decode(text)?;
    let msg = match kind.as_str() {
        "register_confirm" => ServerMsg::RegisterConfirm(payload(&kind, data)?),
        "pixel_update" => ServerMsg::PixelUpdate(payload(&kind, data)?),
        "user_count" => ServerMsg::UserCount(payload(&kind, data)?),
        other => ServerMsg::Unknown(other.to_string()),
    };
    Ok(msg)
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, CodecError> {
    if data.is_null() {
        return Err(CodecError::MissingData("data", kind.to_string()));
    }
    Ok(serde_json::from_value(data)?)
}

pub fn encode_server(msg: &ServerMsg) -> Result<String, CodecError> {
    let value = match msg {
        ServerMsg::RegisterConfirm(data) => json!({ "type": msg.tag(), "data": data }),
        ServerMsg::PixelUpdate(data) => json!({ "type": msg.tag(), "data": data }),
        ServerMsg::UserCount(data) => json!({ "type": msg.tag(), "data": data }),
        ServerMsg::Unknown(tag) => json!({ "type": tag }),
    };
    Ok(serde_json::to_string(&value)?)
}
