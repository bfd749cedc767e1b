use std::collections::HashMap;
use std::sync::Arc;

use log::info;

use crate::api::{ApiGateway, ApiModeConfig, FallbackPolicy};
use crate::config::Config;
use crate::engine::{AssetPathResolver, ImageCodec, LocalAssetStore, LocalStorage, Persistence};
use crate::mock::MockBackend;
use crate::remote::{AuthClient, CredentialStore, HttpClient, HttpImageFetcher, RemoteBackend};
use crate::Result;

/// Everything an editing or display front end needs, wired from one [`Config`].
pub struct Portfolio {
    pub config: Config,
    pub storage: Arc<LocalStorage>,
    pub assets: Arc<LocalAssetStore>,
    pub resolver: AssetPathResolver,
    pub mock: MockBackend,
    pub remote: RemoteBackend,
    pub credentials: Arc<CredentialStore>,
    pub auth: AuthClient,
    pub fetcher: HttpImageFetcher,
    pub gateway: ApiGateway,
}

/// Builds a [`Portfolio`] from `config`.
///
/// 1. If `config.data_dir` is set, storage is loaded from and mirrored to that
///    directory; otherwise it lives in memory only.
/// 2. The API starts in mock or remote mode per `config.use_mock_api` and can
///    be switched later through [`ApiGateway::configure`].
///
/// # Examples
///
/// ```no_run
/// use portfolio_store::{config::Config, sdk};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let portfolio = sdk::open(Config::from_env()?)?;
///     let home = portfolio.gateway.get_home_content().await?;
///     println!("{}", home.hero.title);
///     Ok(())
/// }
/// ```
pub fn open(config: Config) -> Result<Portfolio> {
    let storage = match &config.data_dir {
        Some(dir) => {
            let persistence = Arc::new(Persistence::new(dir)?);
            let initial_data = persistence.load_all()?;
            info!("Loaded {} storage keys from {}", initial_data.len(), dir.display());
            LocalStorage::new(initial_data, config.storage_quota, Some(persistence))
        }
        None => LocalStorage::new(HashMap::new(), config.storage_quota, None),
    };
    let storage = Arc::new(storage);

    let assets = Arc::new(LocalAssetStore::new(storage.clone(), config.keep_images));
    let resolver = AssetPathResolver::new(assets.clone(), ImageCodec::default());

    let credentials = Arc::new(CredentialStore::new(storage.clone()));
    let http = Arc::new(HttpClient::new(&config.api_base_url, config.http, credentials.clone())?);
    let auth = AuthClient::new(http.clone(), credentials.clone());
    let fetcher = HttpImageFetcher::new(&http);

    let mock = MockBackend::new(storage.clone(), config.mock_latency);
    let remote = RemoteBackend::new(http);
    let gateway = ApiGateway::new(
        ApiModeConfig::new(config.use_mock_api),
        FallbackPolicy::from_flag(config.read_fallback),
        (&mock).into(),
        (&remote).into(),
    );

    info!(
        "Portfolio store ready ({} mode, remote {})",
        if config.use_mock_api { "mock" } else { "remote" },
        config.api_base_url
    );

    Ok(Portfolio {
        config,
        storage,
        assets,
        resolver,
        mock,
        remote,
        credentials,
        auth,
        fetcher,
        gateway,
    })
}

/// [`open`] with [`Config::from_env`].
pub fn from_env() -> Result<Portfolio> {
    open(Config::from_env()?)
}
