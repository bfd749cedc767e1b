use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use portfolio_store::config::{Config, HttpConfig};
use portfolio_store::engine::resolver::Resolved;
use portfolio_store::engine::{AssetNamespace, ImageSource, LocalStorage, StoreOptions, DEFAULT_QUOTA};
use portfolio_store::model::{
    AboutMe, BlogPostDraft, BlogPostPatch, ContactInfo, ContactInfoPatch, HomeContent, HomeContentPatch, NamedRef, ProjectDraft,
    Singleton,
};
use portfolio_store::remote::AuthUser;
use portfolio_store::sdk::{self, Portfolio};
use portfolio_store::server::{self, ServerState};
use portfolio_store::{AssetStore, Error};
use tokio::net::TcpListener;

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ServerState::new(Arc::new(LocalStorage::in_memory(DEFAULT_QUOTA)));
    tokio::spawn(async move {
        let _ = server::serve(listener, &state, std::future::pending()).await;
    });
    addr
}

fn config(base_url: String, use_mock_api: bool, data_dir: Option<PathBuf>) -> Config {
    Config {
        use_mock_api,
        api_base_url: base_url,
        data_dir,
        mock_latency: Duration::ZERO,
        http: HttpConfig {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_backoff: Duration::from_millis(10),
        },
        ..Config::default()
    }
}

async fn remote_portfolio() -> Portfolio {
    let addr = spawn_server().await;
    sdk::open(config(format!("http://{}", addr), false, None)).unwrap()
}

fn draft(title: &str, category: &str) -> BlogPostDraft {
    BlogPostDraft {
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        excerpt: "Short".to_string(),
        content: "Long".to_string(),
        cover_image: None,
        category: NamedRef::from(category),
        author: NamedRef::from("Sam"),
        tags: vec!["notes".to_string()],
        published_at: "2024-05-01".to_string(),
        read_time: 3,
        featured: false,
    }
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

#[tokio::test]
async fn test_remote_blog_crud() {
    let p = remote_portfolio().await;
    p.auth.sign_up("Sam", "sam@example.com", "secret").await.unwrap();
    assert!(p.credentials.is_signed_in());

    let api = &p.gateway;
    let seeded = api.get_blog_posts().await.unwrap().len();

    let created = api.create_blog_post(draft("Rust Notes", "Systems")).await.unwrap();
    assert_eq!(created.id as usize, seeded + 1);
    assert_eq!(api.get_blog_post(created.id).await.unwrap(), created);

    let patch = BlogPostPatch {
        title: Some("Rust Field Notes".to_string()),
        ..Default::default()
    };
    let updated = api.update_blog_post(created.id, patch).await.unwrap();
    assert_eq!(updated.title, "Rust Field Notes");
    assert_eq!(updated.slug, created.slug);

    let hits = api.search_blog_posts("field notes").await.unwrap();
    assert_eq!(hits.len(), 1);
    let by_category = api.get_blog_posts_by_category("systems").await.unwrap();
    assert_eq!(by_category, vec![updated.clone()]);

    api.delete_blog_post(created.id).await.unwrap();
    assert!(matches!(api.get_blog_post(created.id).await, Err(Error::NotFound { .. })));
    assert!(matches!(api.delete_blog_post(created.id).await, Err(Error::NotFound { .. })));
    assert_eq!(api.get_blog_posts().await.unwrap().len(), seeded);
}

#[tokio::test]
async fn test_remote_projects_and_pages() {
    let p = remote_portfolio().await;
    p.auth.sign_up("Sam", "sam@example.com", "secret").await.unwrap();
    let api = &p.gateway;

    let project = api
        .create_project(ProjectDraft {
            title: "Image Store".to_string(),
            description: "Bounded asset cache".to_string(),
            image: None,
            tags: vec!["Rust".to_string()],
            github_url: None,
            live_url: None,
            featured: true,
        })
        .await
        .unwrap();
    let tagged = api.get_projects_by_tag("rust").await.unwrap();
    assert!(tagged.iter().any(|x| x.id == project.id));

    let before = api.get_home_content().await.unwrap();
    let mut hero = before.hero.clone();
    hero.title = "Hello again".to_string();
    let patch = HomeContentPatch {
        hero: Some(hero),
        services: None,
    };
    let updated = api.update_home_content(patch).await.unwrap();
    assert_eq!(updated.hero.title, "Hello again");
    assert_eq!(updated.services, before.services);
    assert_eq!(api.get_home_content().await.unwrap(), updated);

    let contact = api
        .update_contact_info(ContactInfoPatch {
            location: Some("Lisbon".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(contact.location, "Lisbon");
    assert_eq!(contact.email, ContactInfo::seed().email);
}

#[tokio::test]
async fn test_stale_token_is_cleared_on_401() {
    let p = remote_portfolio().await;
    let user = AuthUser {
        id: 9,
        name: "Ghost".to_string(),
        email: "ghost@example.com".to_string(),
    };
    p.credentials.store("not-a-session", &user).unwrap();

    let res = p.gateway.create_blog_post(draft("Nope", "Misc")).await;
    assert!(matches!(res, Err(Error::AuthExpired)));
    assert!(!p.credentials.is_signed_in());
    assert!(p.auth.current_user().is_none());
}

#[tokio::test]
async fn test_sign_in_after_sign_up() {
    let p = remote_portfolio().await;
    p.auth.sign_up("Sam", "sam@example.com", "secret").await.unwrap();
    p.auth.sign_out();
    assert!(!p.credentials.is_signed_in());

    assert!(p.auth.sign_in("sam@example.com", "wrong").await.is_err());
    let user = p.auth.sign_in("sam@example.com", "secret").await.unwrap();
    assert_eq!(user.email, "sam@example.com");
}

#[tokio::test]
async fn test_unreachable_remote_falls_back_for_reads_only() {
    // Bind and drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let p = sdk::open(config(format!("http://{}", addr), false, None)).unwrap();

    let home = p.gateway.get_home_content().await.unwrap();
    assert_eq!(home, HomeContent::seed());
    assert!(!p.gateway.get_blog_posts().await.unwrap().is_empty());

    let res = p.gateway.delete_blog_post(1).await;
    assert!(matches!(res, Err(Error::Network(_)) | Err(Error::Timeout(_))));
}

#[tokio::test]
async fn test_remote_without_content_routes_falls_back_for_reads() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, axum::Router::new()).await;
    });
    let p = sdk::open(config(format!("http://{}", addr), false, None)).unwrap();

    assert_eq!(p.gateway.get_home_content().await.unwrap(), HomeContent::seed());
    assert_eq!(p.gateway.get_about_content().await.unwrap(), AboutMe::seed());
    assert!(!p.gateway.get_projects().await.unwrap().is_empty());
    assert!(matches!(p.gateway.get_blog_post(1).await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn test_wrong_password_keeps_existing_session() {
    let p = remote_portfolio().await;
    p.auth.sign_up("Sam", "sam@example.com", "secret").await.unwrap();

    let res = p.auth.sign_in("sam@example.com", "wrong").await;
    assert!(matches!(res, Err(Error::Unauthorized(_))));
    assert!(p.credentials.is_signed_in());
    assert_eq!(p.auth.current_user().unwrap().email, "sam@example.com");
}

#[tokio::test]
async fn test_mock_mode_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("http://127.0.0.1:9".to_string(), true, Some(dir.path().to_path_buf()));

    let created = {
        let p = sdk::open(cfg.clone()).unwrap();
        p.gateway.create_blog_post(draft("Kept", "Misc")).await.unwrap()
    };

    let p = sdk::open(cfg).unwrap();
    assert_eq!(p.gateway.get_blog_post(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn test_large_upload_is_bounded_and_resolvable() {
    let p = sdk::open(config("http://127.0.0.1:9".to_string(), true, None)).unwrap();
    let path = p
        .resolver
        .store(jpeg(3000, 2000), "Sunset Photo.jpg", AssetNamespace::Images, StoreOptions::default())
        .await
        .unwrap()
        .to_string();

    let name = path.strip_prefix("/images/").unwrap();
    let (stamp, rest) = name.split_once('-').unwrap();
    assert_eq!(stamp.len(), 13);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    assert!(rest.ends_with(".jpg") && rest.len() > ".jpg".len());

    let Resolved::Local(asset) = p.resolver.resolve(&path).await.unwrap() else {
        panic!("{} did not resolve locally", path);
    };
    let decoded = image::load_from_memory(&asset.to_bytes().unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1200, 800));
}

#[tokio::test]
async fn test_profile_image_is_replaced_not_accumulated() {
    let p = sdk::open(config("http://127.0.0.1:9".to_string(), true, None)).unwrap();
    let first = p.resolver.store_profile_image(jpeg(64, 64), "me.png").await.unwrap();
    let second = p.resolver.store_profile_image(jpeg(80, 40), "me-again.png").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(p.assets.profile_image_path(), Some(second.clone()));

    let entries = p.assets.list_namespace(AssetNamespace::ProfileImage).await.unwrap();
    assert_eq!(entries.len(), 1);

    let stored = p
        .assets
        .get(AssetNamespace::ProfileImage, second.filename())
        .await
        .unwrap()
        .unwrap();
    let decoded = image::load_from_memory(&stored.to_bytes().unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (80, 40));
}

#[tokio::test]
async fn test_image_namespace_keeps_newest_three() {
    let p = sdk::open(config("http://127.0.0.1:9".to_string(), true, None)).unwrap();
    let mut paths = Vec::new();
    for i in 0..5 {
        let options = StoreOptions {
            fixed_name: Some(format!("shot{}.jpg", i)),
            skip_timestamp: true,
            ..Default::default()
        };
        paths.push(
            p.resolver
                .store(jpeg(32, 32), "x.jpg", AssetNamespace::Images, options)
                .await
                .unwrap(),
        );
    }

    let entries = p.assets.list_namespace(AssetNamespace::Images).await.unwrap();
    let kept: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
    assert_eq!(kept, vec![paths[4].clone(), paths[3].clone(), paths[2].clone()]);
    assert_eq!(p.resolver.resolve(&paths[0].to_string()).await.unwrap(), Resolved::Missing);
}

#[tokio::test]
async fn test_display_source_against_live_server() {
    let p = remote_portfolio().await;
    let src = p
        .resolver
        .display_source("/uploads/missing.jpg", "/placeholder.jpg", &p.fetcher)
        .await;
    assert_eq!(src, ImageSource::Fallback("/placeholder.jpg".to_string()));

    let path = p.resolver.store_profile_image(jpeg(48, 48), "me.jpg").await.unwrap();
    let src = p
        .resolver
        .display_source(&path.to_string(), "/placeholder.jpg", &p.fetcher)
        .await;
    assert!(matches!(src, ImageSource::Local(_)));
}
