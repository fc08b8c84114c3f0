//! Shared test setup: tempfile-backed SQLite storage and seed helpers.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, EntityTrait};
use tempfile::TempDir;

use migration::entities::{custom_domain, link, organization};
use shortspace::storage::SeaOrmStorage;

/// 每个测试一个独立的 SQLite 库；TempDir 必须活到测试结束
pub async fn new_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("shortspace_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    (storage, temp_dir)
}

pub struct OrgSeed<'a> {
    pub id: &'a str,
    pub slug: &'a str,
    pub plan_tier: &'a str,
    pub primary_domain: Option<&'a str>,
    pub status: &'a str,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Default for OrgSeed<'static> {
    fn default() -> Self {
        Self {
            id: "org_acme",
            slug: "acme",
            plan_tier: "free",
            primary_domain: None,
            status: "active",
            deleted_at: None,
        }
    }
}

pub async fn seed_org(storage: &SeaOrmStorage, seed: OrgSeed<'_>) {
    let model = organization::ActiveModel {
        id: Set(seed.id.to_string()),
        slug: Set(seed.slug.to_string()),
        plan_tier: Set(seed.plan_tier.to_string()),
        primary_domain: Set(seed.primary_domain.map(String::from)),
        status: Set(seed.status.to_string()),
        deleted_at: Set(seed.deleted_at),
        created_at: Set(Utc::now()),
    };
    organization::Entity::insert(model)
        .exec(storage.get_db())
        .await
        .expect("Failed to seed organization");
}

pub async fn seed_domain(storage: &SeaOrmStorage, id: &str, organization_id: &str, hostname: &str) {
    let model = custom_domain::ActiveModel {
        id: Set(id.to_string()),
        organization_id: Set(organization_id.to_string()),
        hostname: Set(hostname.to_string()),
        status: Set("verified".to_string()),
        verification_token: Set(None),
        created_at: Set(Utc::now()),
    };
    custom_domain::Entity::insert(model)
        .exec(storage.get_db())
        .await
        .expect("Failed to seed custom domain");
}

pub struct LinkSeed<'a> {
    pub id: &'a str,
    pub organization_id: &'a str,
    pub domain_id: Option<&'a str>,
    pub slug: &'a str,
    pub destination_url: &'a str,
    pub status: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Default for LinkSeed<'static> {
    fn default() -> Self {
        Self {
            id: "lnk_launch",
            organization_id: "org_acme",
            domain_id: None,
            slug: "launch",
            destination_url: "https://example.com/launch",
            status: "active",
            expires_at: None,
            created_at: Utc::now(),
        }
    }
}

pub async fn seed_link(storage: &SeaOrmStorage, seed: LinkSeed<'_>) {
    let model = link::ActiveModel {
        id: Set(seed.id.to_string()),
        organization_id: Set(seed.organization_id.to_string()),
        domain_id: Set(seed.domain_id.map(String::from)),
        slug: Set(seed.slug.to_string()),
        destination_url: Set(seed.destination_url.to_string()),
        status: Set(seed.status.to_string()),
        expires_at: Set(seed.expires_at),
        click_count: Set(0),
        unique_visitors: Set(0),
        last_clicked_at: Set(None),
        created_at: Set(seed.created_at),
    };
    link::Entity::insert(model)
        .exec(storage.get_db())
        .await
        .expect("Failed to seed link");
}
