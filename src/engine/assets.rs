use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::engine::path::VirtualPath;
use crate::engine::LocalStorage;
use crate::{AssetStore, Error, Result};

/// Storage key of the side-record pointing at the current profile image.
pub const PROFILE_PATH_KEY: &str = "profile_image_path";

/// Default number of general images retained.
pub const DEFAULT_KEEP_IMAGES: usize = 3;

const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// A named partition of the asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetNamespace {
    Images,
    ProfileImage,
}

impl AssetNamespace {
    pub const ALL: [AssetNamespace; 2] = [AssetNamespace::Images, AssetNamespace::ProfileImage];

    /// The first segment of virtual paths in this namespace.
    pub fn alias(self) -> &'static str {
        match self {
            AssetNamespace::Images => "images",
            AssetNamespace::ProfileImage => "profile-image",
        }
    }

    /// The [`LocalStorage`] key holding the serialized namespace map.
    pub fn storage_key(self) -> &'static str {
        match self {
            AssetNamespace::Images => "portfolio_images",
            AssetNamespace::ProfileImage => "portfolio_profile_image",
        }
    }

    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.alias() == alias)
    }
}

impl fmt::Display for AssetNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// A JPEG image encoded as a base64 data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedAsset(String);

impl EncodedAsset {
    pub fn from_jpeg(bytes: &[u8]) -> Self {
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("{}{}", JPEG_DATA_URI_PREFIX, b64))
    }

    /// Wraps an existing data URI; anything else is rejected.
    pub fn from_data_uri(uri: String) -> Result<Self> {
        if uri.starts_with("data:image/") && uri.contains(";base64,") {
            Ok(Self(uri))
        } else {
            Err(Error::Decode("not a base64 image data URI".to_string()))
        }
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or("application/octet-stream")
    }

    /// Decodes the payload back to raw image bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = self
            .0
            .split_once(";base64,")
            .map(|(_, p)| p)
            .ok_or_else(|| Error::Decode("missing base64 payload".to_string()))?;
        Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
    }

    /// Length of the encoded form, which is what counts against the storage budget.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAsset {
    data: EncodedAsset,
    written_at: u64,
}

type NamespaceMap = BTreeMap<String, StoredAsset>;

/// A namespace entry as returned by [`AssetStore::list_namespace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub path: VirtualPath,
    pub written_at: u64,
    pub encoded_len: usize,
}

/// What a [`AssetStore::put`] actually did.
///
/// A non-empty `emergency_cleared` means the write only succeeded after
/// wiping other namespaces and this namespace's history: a lossy, best-effort
/// recovery rather than a transactional guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReport {
    pub path: VirtualPath,
    pub evicted: Vec<String>,
    pub emergency_cleared: Vec<AssetNamespace>,
}

impl PutReport {
    pub fn was_lossy(&self) -> bool {
        !self.emergency_cleared.is_empty()
    }
}

/// [`AssetStore`] backed by [`LocalStorage`].
///
/// Each namespace is one JSON map `filename -> {data, writtenAt}` under the
/// namespace's storage key. `writtenAt` is strictly increasing within a
/// namespace, so eviction order never depends on how files are named.
pub struct LocalAssetStore {
    storage: Arc<LocalStorage>,
    keep_images: usize,
}

impl LocalAssetStore {
    pub fn new(storage: Arc<LocalStorage>, keep_images: usize) -> Self {
        Self {
            storage,
            keep_images: keep_images.max(1),
        }
    }

    /// How many entries a namespace retains after each write.
    pub fn keep_count(&self, namespace: AssetNamespace) -> usize {
        match namespace {
            AssetNamespace::Images => self.keep_images,
            AssetNamespace::ProfileImage => 1,
        }
    }

    /// The virtual path of the current profile image, if one was stored.
    pub fn profile_image_path(&self) -> Option<VirtualPath> {
        self.storage
            .get_item(PROFILE_PATH_KEY)
            .and_then(|p| VirtualPath::parse(&p))
    }

    fn load_map(&self, namespace: AssetNamespace) -> Result<NamespaceMap> {
        match self.storage.get_item(namespace.storage_key()) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(NamespaceMap::new()),
        }
    }

    fn remove_namespace(&self, namespace: AssetNamespace) {
        self.storage.remove_item(namespace.storage_key());
        if namespace == AssetNamespace::ProfileImage {
            self.storage.remove_item(PROFILE_PATH_KEY);
        }
    }

    fn next_stamp(map: &NamespaceMap) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let newest = map.values().map(|a| a.written_at).max().unwrap_or(0);
        now.max(newest + 1)
    }

    /// Drops all but the `keep` newest entries and returns the dropped names.
    fn evict_oldest(map: &mut NamespaceMap, keep: usize) -> Vec<String> {
        if map.len() <= keep {
            return Vec::new();
        }
        let mut by_age: Vec<(u64, String)> = map.iter().map(|(k, v)| (v.written_at, k.clone())).collect();
        by_age.sort_by(|a, b| b.cmp(a));
        let evicted: Vec<String> = by_age.into_iter().skip(keep).map(|(_, name)| name).collect();
        for name in &evicted {
            map.remove(name);
        }
        evicted
    }

    fn record_profile_path(&self, path: &VirtualPath) {
        if let Err(e) = self.storage.set_item(PROFILE_PATH_KEY, &path.to_string()) {
            warn!("Stored profile image but could not record its path: {}", e);
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, namespace: AssetNamespace, filename: &str, asset: EncodedAsset) -> Result<PutReport> {
        let mut map = self.load_map(namespace).unwrap_or_else(|e| {
            warn!("Discarding unreadable {} namespace: {}", namespace, e);
            NamespaceMap::new()
        });

        let stored = StoredAsset {
            data: asset,
            written_at: Self::next_stamp(&map),
        };
        map.insert(filename.to_string(), stored.clone());
        let evicted = Self::evict_oldest(&mut map, self.keep_count(namespace));
        if !evicted.is_empty() {
            debug!("Evicted {} old asset(s) from {}: {:?}", evicted.len(), namespace, evicted);
        }

        let mut report = PutReport {
            path: VirtualPath::new(namespace, filename),
            evicted,
            emergency_cleared: Vec::new(),
        };

        match self.storage.set_item(namespace.storage_key(), &serde_json::to_string(&map)?) {
            Ok(()) => {}
            Err(Error::QuotaExceeded { needed, available, .. }) => {
                warn!(
                    "Storage full writing {} ({} bytes needed, {} available); clearing other namespaces",
                    report.path, needed, available
                );
                for other in AssetNamespace::ALL.into_iter().filter(|ns| *ns != namespace) {
                    self.remove_namespace(other);
                    report.emergency_cleared.push(other);
                }
                report.evicted.extend(map.keys().filter(|k| k.as_str() != filename).cloned());

                let mut only = NamespaceMap::new();
                only.insert(filename.to_string(), stored);
                if let Err(e) = self.storage.set_item(namespace.storage_key(), &serde_json::to_string(&only)?) {
                    return Err(Error::StorageExhausted {
                        namespace: namespace.to_string(),
                        reason: e.to_string(),
                    });
                }
                warn!(
                    "Recovered by discarding {} asset(s) and namespaces {:?}",
                    report.evicted.len(),
                    report.emergency_cleared
                );
            }
            Err(e) => return Err(e),
        }

        if namespace == AssetNamespace::ProfileImage {
            self.record_profile_path(&report.path);
        }
        Ok(report)
    }

    async fn get(&self, namespace: AssetNamespace, filename: &str) -> Result<Option<EncodedAsset>> {
        let map = self.load_map(namespace)?;
        Ok(map.get(filename).map(|a| a.data.clone()))
    }

    async fn list_namespace(&self, namespace: AssetNamespace) -> Result<Vec<AssetEntry>> {
        let map = self.load_map(namespace)?;
        let mut entries: Vec<AssetEntry> = map
            .iter()
            .map(|(name, a)| AssetEntry {
                path: VirtualPath::new(namespace, name),
                written_at: a.written_at,
                encoded_len: a.data.len(),
            })
            .collect();
        entries.sort_by(|a, b| b.written_at.cmp(&a.written_at));
        Ok(entries)
    }

    async fn clear_namespace(&self, namespace: AssetNamespace) -> Result<()> {
        self.remove_namespace(namespace);
        Ok(())
    }
}
