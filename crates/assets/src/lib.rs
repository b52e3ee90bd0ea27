//! Asset import for the Vantage renderer.
//!
//! Meshes come from glTF files flattened into a plain triangle list, images
//! are decoded to tightly packed RGBA8, and cubemap faces are loaded as an
//! all-or-nothing set. Renderers consume the decoded data; nothing here
//! touches the GPU.
//!
//! All loaders return `Result` — a failed asset is reported by the caller
//! and simply never becomes a renderer. Loading is synchronous and runs to
//! completion on the calling thread.

mod image_data;
mod mesh;

pub use image_data::{ChannelLayout, ImageData, decode_image, decode_image_bytes};
pub use mesh::{CUBEMAP_FACE_NAMES, MeshData, import_mesh, load_cubemap_faces};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF import error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("mesh import error: {0}")]
    MeshImport(String),
    #[error("image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("cubemap face {face}: {source}")]
    CubemapFace {
        face: &'static str,
        source: Box<AssetError>,
    },
    #[error("cubemap faces must be uniform squares; face {face} is {width}x{height}")]
    CubemapFaceMismatch {
        face: &'static str,
        width: u32,
        height: u32,
    },
}
