use serde::{Deserialize, Serialize};

use super::Singleton;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub icon: String,
}

/// Home page: hero banner plus the list of offered services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeContent {
    pub hero: Hero,
    #[serde(default)]
    pub services: Vec<ServiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub period: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutMe {
    pub name: String,
    pub title: String,
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeContentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<Hero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ServiceItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<Vec<SocialLink>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutMePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<Experience>>,
}

impl From<HomeContent> for HomeContentPatch {
    fn from(c: HomeContent) -> Self {
        Self {
            hero: Some(c.hero),
            services: Some(c.services),
        }
    }
}

impl Singleton for HomeContent {
    type Patch = HomeContentPatch;

    const NAME: &'static str = "home content";
    const STORAGE_KEY: &'static str = "mock_home_content";
    const ENDPOINT: &'static str = "/api/home";

    fn apply(&mut self, patch: HomeContentPatch) {
        if let Some(v) = patch.hero { self.hero = v; }
        if let Some(v) = patch.services { self.services = v; }
    }

    fn seed() -> Self {
        Self {
            hero: Hero {
                title: "Hi, I'm Alex".to_string(),
                subtitle: "Full-stack developer".to_string(),
                description: "I build fast, accessible web applications.".to_string(),
                cta_text: "See my work".to_string(),
                cta_link: "/projects".to_string(),
                image: Some("/profile-image/profile.jpg".to_string()),
            },
            services: vec![
                ServiceItem {
                    id: 1,
                    title: "Web Development".to_string(),
                    description: "Responsive sites and web apps.".to_string(),
                    icon: "code".to_string(),
                },
                ServiceItem {
                    id: 2,
                    title: "UI Design".to_string(),
                    description: "Clean interfaces with a consistent system.".to_string(),
                    icon: "palette".to_string(),
                },
            ],
        }
    }
}

impl Singleton for ContactInfo {
    type Patch = ContactInfoPatch;

    const NAME: &'static str = "contact info";
    const STORAGE_KEY: &'static str = "mock_contact_info";
    const ENDPOINT: &'static str = "/api/contact";

    fn apply(&mut self, patch: ContactInfoPatch) {
        if let Some(v) = patch.email { self.email = v; }
        if let Some(v) = patch.phone { self.phone = v; }
        if let Some(v) = patch.location { self.location = v; }
        if let Some(v) = patch.availability { self.availability = Some(v); }
        if let Some(v) = patch.social_links { self.social_links = v; }
    }

    fn seed() -> Self {
        Self {
            email: "hello@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
            location: "Remote".to_string(),
            availability: Some("Open to freelance work".to_string()),
            social_links: vec![SocialLink {
                platform: "github".to_string(),
                url: "https://github.com/example".to_string(),
            }],
        }
    }
}

impl Singleton for AboutMe {
    type Patch = AboutMePatch;

    const NAME: &'static str = "about content";
    const STORAGE_KEY: &'static str = "mock_about_content";
    const ENDPOINT: &'static str = "/api/about";

    fn apply(&mut self, patch: AboutMePatch) {
        if let Some(v) = patch.name { self.name = v; }
        if let Some(v) = patch.title { self.title = v; }
        if let Some(v) = patch.bio { self.bio = v; }
        if let Some(v) = patch.profile_image { self.profile_image = Some(v); }
        if let Some(v) = patch.skills { self.skills = v; }
        if let Some(v) = patch.experience { self.experience = v; }
    }

    fn seed() -> Self {
        Self {
            name: "Alex Morgan".to_string(),
            title: "Full-stack developer".to_string(),
            bio: "I have been building for the web for ten years.".to_string(),
            profile_image: Some("/profile-image/profile.jpg".to_string()),
            skills: vec!["Rust".to_string(), "TypeScript".to_string(), "React".to_string()],
            experience: vec![Experience {
                company: "Acme".to_string(),
                role: "Senior Engineer".to_string(),
                period: "2020 - present".to_string(),
                description: "Frontend platform and tooling.".to_string(),
            }],
        }
    }
}
