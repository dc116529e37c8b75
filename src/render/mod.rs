//! Render device interface and vertex layouts

pub mod device;
pub mod vertex;
pub mod recording;

pub use device::{BufferId, DrawCall, PrimitiveType, RenderDevice, SkinId};
pub use vertex::{DetailVertex, PatchVertices, TerrainVertex, VertexFormat, VertexSlice};
pub use recording::{RecordedDraw, RecordingDevice};
