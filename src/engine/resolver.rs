use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::engine::assets::{AssetNamespace, EncodedAsset, PutReport};
use crate::engine::codec::{ImageCodec, Quality};
use crate::engine::path::{is_local, sanitize_filename, VirtualPath};
use crate::{AssetStore, Error, Result};

/// Fixed filename used for the profile image so re-uploads overwrite it.
pub const PROFILE_FILENAME: &str = "profile.jpg";

/// How [`AssetPathResolver::store`] names and encodes an upload.
///
/// With both `fixed_name` and `skip_timestamp` set the file is stored under
/// the sanitized fixed name. Otherwise it is `<millis>-<sanitized original name>`
/// and `fixed_name` is ignored.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub fixed_name: Option<String>,
    pub skip_timestamp: bool,
    pub quality: Quality,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            fixed_name: None,
            skip_timestamp: false,
            quality: Quality::Standard,
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: VirtualPath,
    pub width: u32,
    pub height: u32,
    pub report: PutReport,
}

/// Outcome of resolving a `src` string against the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Local(EncodedAsset),
    /// Looked local but nothing is stored under it.
    Missing,
    /// Not a local path; the caller should use it as-is.
    PassThrough(String),
}

/// What a display component should actually render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(EncodedAsset),
    Remote(String),
    Fallback(String),
}

impl ImageSource {
    /// The string to put in an `src` attribute.
    pub fn as_src(&self) -> &str {
        match self {
            ImageSource::Local(a) => a.as_data_uri(),
            ImageSource::Remote(url) | ImageSource::Fallback(url) => url,
        }
    }
}

/// Checks whether a non-local image source can be loaded.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn is_loadable(&self, src: &str) -> bool;
}

/// Maps uploads to virtual paths and virtual paths back to stored image data.
pub struct AssetPathResolver {
    store: Arc<dyn AssetStore>,
    codec: ImageCodec,
    last_stamp: AtomicU64,
}

impl AssetPathResolver {
    pub fn new(store: Arc<dyn AssetStore>, codec: ImageCodec) -> Self {
        Self {
            store,
            codec,
            last_stamp: AtomicU64::new(0),
        }
    }

    /// Epoch millis, bumped past the previous stamp so two uploads never share one.
    fn next_stamp(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let prev = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    fn filename_for(&self, original_name: &str, options: &StoreOptions) -> String {
        match (&options.fixed_name, options.skip_timestamp) {
            (Some(fixed), true) => sanitize_filename(fixed),
            _ => format!("{}-{}", self.next_stamp(), sanitize_filename(original_name)),
        }
    }

    /// Compresses `bytes` and stores the result, returning its virtual path.
    pub async fn store(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        namespace: AssetNamespace,
        options: StoreOptions,
    ) -> Result<VirtualPath> {
        Ok(self.store_detailed(bytes, original_name, namespace, options).await?.path)
    }

    /// Like [`AssetPathResolver::store`] but also reports dimensions and evictions.
    pub async fn store_detailed(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        namespace: AssetNamespace,
        options: StoreOptions,
    ) -> Result<StoredUpload> {
        let codec = self.codec;
        let quality = options.quality;
        let compressed = tokio::task::spawn_blocking(move || codec.compress(&bytes, quality))
            .await
            .map_err(|e| Error::Internal(format!("compression task failed: {}", e)))??;

        let filename = self.filename_for(original_name, &options);
        let report = self.store.put(namespace, &filename, compressed.asset).await?;
        if report.was_lossy() {
            warn!("Stored {} only after clearing {:?}", report.path, report.emergency_cleared);
        }

        Ok(StoredUpload {
            path: report.path.clone(),
            width: compressed.width,
            height: compressed.height,
            report,
        })
    }

    /// Stores a crop-confirmed profile image under its fixed name.
    pub async fn store_profile_image(&self, bytes: Vec<u8>, original_name: &str) -> Result<VirtualPath> {
        let options = StoreOptions {
            fixed_name: Some(PROFILE_FILENAME.to_string()),
            skip_timestamp: true,
            quality: Quality::CropConfirmed,
        };
        self.store(bytes, original_name, AssetNamespace::ProfileImage, options).await
    }

    /// Looks `src` up in the local store if it is a local path.
    pub async fn resolve(&self, src: &str) -> Result<Resolved> {
        if !is_local(src) {
            return Ok(Resolved::PassThrough(src.to_string()));
        }
        let Some(path) = VirtualPath::parse(src) else {
            return Ok(Resolved::Missing);
        };
        Ok(match self.store.get(path.namespace(), path.filename()).await? {
            Some(asset) => Resolved::Local(asset),
            None => Resolved::Missing,
        })
    }

    /// Picks what to render for `src`: local store, then `src` itself, then `fallback`.
    ///
    /// A local hit never touches the network. Misses are expected for external
    /// and default images and are only logged at debug level.
    pub async fn display_source(&self, src: &str, fallback: &str, fetcher: &dyn ImageFetcher) -> ImageSource {
        match self.resolve(src).await {
            Ok(Resolved::Local(asset)) => return ImageSource::Local(asset),
            Ok(_) => {}
            Err(e) => debug!("Local lookup of {} failed: {}", src, e),
        }
        if fetcher.is_loadable(src).await {
            ImageSource::Remote(src.to_string())
        } else {
            debug!("Falling back to {} for {}", fallback, src);
            ImageSource::Fallback(fallback.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LocalAssetStore, LocalStorage, DEFAULT_QUOTA};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        loadable: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageFetcher for CountingFetcher {
        async fn is_loadable(&self, _src: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.loadable
        }
    }

    fn fetcher(loadable: bool) -> CountingFetcher {
        CountingFetcher { loadable, calls: AtomicUsize::new(0) }
    }

    fn resolver() -> AssetPathResolver {
        let storage = Arc::new(LocalStorage::in_memory(DEFAULT_QUOTA));
        AssetPathResolver::new(Arc::new(LocalAssetStore::new(storage, 3)), ImageCodec::default())
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 90, 160]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn test_timestamped_filename() {
        let r = resolver();
        let path = r
            .store(jpeg(40, 30), "Beach Day.png", AssetNamespace::Images, StoreOptions::default())
            .await
            .unwrap();
        let name = path.filename();
        let (stamp, rest) = name.split_once('-').unwrap();
        assert_eq!(stamp.len(), 13);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "BeachDay.jpg");
    }

    #[tokio::test]
    async fn test_fixed_name_without_timestamp() {
        let r = resolver();
        let options = StoreOptions {
            fixed_name: Some("hero.jpg".to_string()),
            skip_timestamp: true,
            ..Default::default()
        };
        let path = r.store(jpeg(40, 30), "x.png", AssetNamespace::Images, options).await.unwrap();
        assert_eq!(path.to_string(), "/images/hero.jpg");
    }

    #[tokio::test]
    async fn test_back_to_back_uploads_get_distinct_paths() {
        let r = resolver();
        for _ in 0..20 {
            let first = r
                .store(jpeg(4, 4), "a.jpg", AssetNamespace::Images, StoreOptions::default())
                .await
                .unwrap();
            let second = r
                .store(jpeg(4, 4), "a.jpg", AssetNamespace::Images, StoreOptions::default())
                .await
                .unwrap();
            assert_ne!(first, second);
            assert!(matches!(r.resolve(&first.to_string()).await.unwrap(), Resolved::Local(_)));
            assert!(matches!(r.resolve(&second.to_string()).await.unwrap(), Resolved::Local(_)));
        }
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let r = resolver();
        let stamps: Vec<u64> = (0..1000).map(|_| r.next_stamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_fixed_name_needs_skip_timestamp() {
        let r = resolver();
        let options = StoreOptions {
            fixed_name: Some("hero.jpg".to_string()),
            skip_timestamp: false,
            ..Default::default()
        };
        let path = r.store(jpeg(8, 8), "Team Photo.png", AssetNamespace::Images, options).await.unwrap();
        let (stamp, rest) = path.filename().split_once('-').unwrap();
        assert_eq!(stamp.len(), 13);
        assert_eq!(rest, "TeamPhoto.jpg");
    }

    #[tokio::test]
    async fn test_resolve_round_trip_and_pass_through() {
        let r = resolver();
        let path = r
            .store(jpeg(40, 30), "a.jpg", AssetNamespace::Images, StoreOptions::default())
            .await
            .unwrap();

        assert!(matches!(r.resolve(&path.to_string()).await.unwrap(), Resolved::Local(_)));
        assert!(matches!(
            r.resolve(&format!("{}?cache=1", path)).await.unwrap(),
            Resolved::Local(_)
        ));
        assert_eq!(r.resolve("/images/missing.jpg").await.unwrap(), Resolved::Missing);
        assert_eq!(
            r.resolve("https://cdn.example.com/a.jpg").await.unwrap(),
            Resolved::PassThrough("https://cdn.example.com/a.jpg".to_string())
        );
    }

    #[tokio::test]
    async fn test_decode_failure_stores_nothing() {
        let r = resolver();
        let res = r
            .store(b"nope".to_vec(), "a.jpg", AssetNamespace::Images, StoreOptions::default())
            .await;
        assert!(matches!(res, Err(Error::Decode(_))));
        assert!(r.store.list_namespace(AssetNamespace::Images).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_display_source_local_hit_skips_network() {
        let r = resolver();
        let path = r.store_profile_image(jpeg(64, 64), "me.png").await.unwrap();
        let f = fetcher(true);
        let src = r.display_source(&path.to_string(), "/placeholder.jpg", &f).await;
        assert!(matches!(src, ImageSource::Local(_)));
        assert!(src.as_src().starts_with("data:image/jpeg;base64,"));
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_display_source_falls_through_tiers() {
        let r = resolver();

        let ok = fetcher(true);
        let src = r.display_source("/images/gone.jpg", "/placeholder.jpg", &ok).await;
        assert_eq!(src, ImageSource::Remote("/images/gone.jpg".to_string()));

        let down = fetcher(false);
        let src = r.display_source("https://x.test/a.jpg", "/placeholder.jpg", &down).await;
        assert_eq!(src, ImageSource::Fallback("/placeholder.jpg".to_string()));
        assert_eq!(down.calls.load(Ordering::SeqCst), 1);
    }
}
