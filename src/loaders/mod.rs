pub mod asset_loader;
pub mod gltf;

pub use asset_loader::{AssetLoader, LoadPoll, LoadResult, PendingAsset};
pub use self::gltf::{from_document, load_gltf};
