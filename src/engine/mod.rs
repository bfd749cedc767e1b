pub mod assets;
pub mod codec;
pub mod path;
pub mod persistence;
pub mod resolver;
pub mod storage;

pub use assets::{AssetNamespace, EncodedAsset, LocalAssetStore, PutReport};
pub use codec::{ImageCodec, Quality};
pub use path::VirtualPath;
pub use persistence::Persistence;
pub use resolver::{AssetPathResolver, ImageFetcher, ImageSource, Resolved, StoreOptions};
pub use storage::{LocalStorage, DEFAULT_QUOTA};
