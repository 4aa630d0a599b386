mod error;
mod manifest;
mod mesh_manifest;
mod writer;

pub use error::PersistError;
pub use manifest::{write_manifest, BlockInfo, RankManifest};
pub use mesh_manifest::{write_mesh_manifest, DictionaryManifest, EntitiesManifest};
pub use writer::BinaryDataWriter;
