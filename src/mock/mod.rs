//! In-process simulation of the content backend.
//!
//! Every call waits a fixed artificial latency before touching data, so UI
//! code always sees a pending interval, and every mutation is written through
//! to [`LocalStorage`] before the call resolves.

pub mod collection;

pub use collection::{MockCollection, MockSingleton};

use std::sync::Arc;
use std::time::Duration;

use crate::engine::LocalStorage;
use crate::model::{AboutMe, BlogPost, ContactInfo, HomeContent, Project};

/// Default simulated round-trip.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(300);

/// The full set of mock content stores sharing one [`LocalStorage`].
pub struct MockBackend {
    pub blog: Arc<MockCollection<BlogPost>>,
    pub projects: Arc<MockCollection<Project>>,
    pub home: Arc<MockSingleton<HomeContent>>,
    pub contact: Arc<MockSingleton<ContactInfo>>,
    pub about: Arc<MockSingleton<AboutMe>>,
}

impl MockBackend {
    pub fn new(storage: Arc<LocalStorage>, latency: Duration) -> Self {
        Self {
            blog: Arc::new(MockCollection::new(storage.clone(), latency)),
            projects: Arc::new(MockCollection::new(storage.clone(), latency)),
            home: Arc::new(MockSingleton::new(storage.clone(), latency)),
            contact: Arc::new(MockSingleton::new(storage.clone(), latency)),
            about: Arc::new(MockSingleton::new(storage, latency)),
        }
    }

    /// Restores every content type to its compiled-in defaults.
    pub fn reset(&self) {
        self.blog.reset();
        self.projects.reset();
        self.home.reset();
        self.contact.reset();
        self.about.reset();
    }
}
