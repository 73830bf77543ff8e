pub mod api;
pub mod backoff;
pub mod bus;
pub mod channel;
pub mod client;
pub mod codec;
pub mod color;
pub mod config;
pub mod cooldown;
pub mod grid;
pub mod input;
pub mod pending;
pub mod protocol;
pub mod raster;
pub mod render;
pub mod store;
pub mod viewport;

pub use api::{ApiError, PixelApi};
pub use backoff::Backoff;
pub use bus::{EventBus, Subscription};
pub use channel::{ChannelEvent, ChannelHost, ConnectionState, Generation, SyncChannel};
pub use client::{ChangeOrigin, ClientEvent, PixelClient, WriteOutcome};
pub use codec::{decode, decode_server, encode, encode_client, encode_server, CodecError};
pub use color::{Color, ColorError, PALETTE};
pub use config::{BackoffConfig, ClientConfig, RenderStyle, ViewConfig};
pub use cooldown::{parse_cooldown, CooldownTimer};
pub use grid::{cells_from_wire, CellCoord, GridDims, GridError, GridStore};
pub use input::{CanvasInput, InputModifiers, PointerButton};
pub use pending::PendingWrites;
pub use protocol::{
    ClientMsg, ErrorBody, GridResponse, PixelUpdate, PlaceAck, PlacePixelRequest, ServerMsg,
    UserCount, WriteIntent,
};
pub use raster::{RasterLayer, RasterSurface};
pub use render::{DrawTarget, LineSegment, RenderEngine, Surface};
pub use store::{ClientStore, MemoryStore};
pub use viewport::{CellWindow, GridPoint, Rect, ScreenPoint, Viewport};
