//! In-memory repositories used when no database is configured, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use showroom_core::{Catalog, CatalogId, NewCatalog, ShopDomain};
use tokio::sync::RwLock;

use super::{CatalogRepository, RepositoryError, SessionRepository, ShopifySession};

/// Sessions kept in a process-local map.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, ShopifySession>>,
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn store(&self, session: &ShopifySession) -> Result<(), RepositoryError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<ShopifySession>, RepositoryError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let removed = ids.iter().filter(|id| sessions.remove(*id).is_some()).count();
        Ok(removed as u64)
    }

    async fn find_by_shop(&self, shop: &ShopDomain) -> Result<Vec<ShopifySession>, RepositoryError> {
        let mut found: Vec<ShopifySession> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| &s.shop == shop)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}

/// Catalogs kept in insertion order.
///
/// Each record carries an insertion sequence so catalogs created within the
/// same clock tick still list newest first.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    catalogs: RwLock<Vec<(u64, Catalog)>>,
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn create(&self, catalog: NewCatalog) -> Result<Catalog, RepositoryError> {
        let catalog = catalog.into_catalog(CatalogId::generate(), Utc::now());
        let mut catalogs = self.catalogs.write().await;
        let position = catalogs.last().map_or(0, |(p, _)| p + 1);
        catalogs.push((position, catalog.clone()));
        Ok(catalog)
    }

    async fn list(&self, shop: &ShopDomain) -> Result<Vec<Catalog>, RepositoryError> {
        let catalogs = self.catalogs.read().await;
        let mut owned: Vec<&(u64, Catalog)> =
            catalogs.iter().filter(|(_, c)| &c.shop == shop).collect();
        owned.sort_by(|(pa, a), (pb, b)| b.created_at.cmp(&a.created_at).then(pb.cmp(pa)));
        Ok(owned.into_iter().map(|(_, c)| c.clone()).collect())
    }

    async fn get(&self, id: CatalogId) -> Result<Option<Catalog>, RepositoryError> {
        Ok(self
            .catalogs
            .read()
            .await
            .iter()
            .find(|(_, c)| c.id == id)
            .map(|(_, c)| c.clone()))
    }

    async fn delete_many(
        &self,
        shop: &ShopDomain,
        ids: &[CatalogId],
    ) -> Result<Vec<CatalogId>, RepositoryError> {
        let mut catalogs = self.catalogs.write().await;
        let mut deleted = Vec::new();
        for id in ids {
            if deleted.contains(id) {
                continue;
            }
            if let Some(index) = catalogs
                .iter()
                .position(|(_, c)| c.id == *id && &c.shop == shop)
            {
                catalogs.remove(index);
                deleted.push(*id);
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use showroom_core::ProductSnapshot;

    use super::*;

    fn shop(handle: &str) -> ShopDomain {
        ShopDomain::parse(&format!("{handle}.myshopify.com")).unwrap()
    }

    fn new_catalog(shop: &ShopDomain, title: &str) -> NewCatalog {
        NewCatalog {
            shop: shop.clone(),
            title: title.to_string(),
            lead_text: None,
            products: vec![ProductSnapshot::new("p1", "Vase")],
            credentials: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = InMemoryCatalogRepository::default();
        let gallery = shop("gallery");
        let a = repo.create(new_catalog(&gallery, "A")).await.unwrap();
        let b = repo.create(new_catalog(&gallery, "B")).await.unwrap();
        let c = repo.create(new_catalog(&gallery, "C")).await.unwrap();

        let ids: Vec<CatalogId> = repo
            .list(&gallery)
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn test_list_is_scoped_by_shop() {
        let repo = InMemoryCatalogRepository::default();
        repo.create(new_catalog(&shop("gallery"), "Mine"))
            .await
            .unwrap();
        repo.create(new_catalog(&shop("other"), "Theirs"))
            .await
            .unwrap();

        let listed = repo.list(&shop("gallery")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Mine");
    }

    #[tokio::test]
    async fn test_delete_many_reports_removed_ids() {
        let repo = InMemoryCatalogRepository::default();
        let gallery = shop("gallery");
        let a = repo.create(new_catalog(&gallery, "A")).await.unwrap();
        let b = repo.create(new_catalog(&gallery, "B")).await.unwrap();
        let foreign = repo.create(new_catalog(&shop("other"), "X")).await.unwrap();
        let missing = CatalogId::generate();

        let deleted = repo
            .delete_many(&gallery, &[b.id, missing, a.id, foreign.id])
            .await
            .unwrap();
        assert_eq!(deleted, vec![b.id, a.id]);
        assert!(repo.get(a.id).await.unwrap().is_none());
        assert!(repo.get(foreign.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sessions_by_shop_and_delete_many() {
        let repo = InMemorySessionRepository::default();
        for (id, handle) in [("offline_a", "a"), ("a_1", "a"), ("offline_b", "b")] {
            repo.store(&ShopifySession {
                id: id.to_string(),
                shop: shop(handle),
                state: String::new(),
                is_online: false,
                scope: String::new(),
                access_token: SecretString::from("token"),
                expires: None,
                associated_user_id: None,
            })
            .await
            .unwrap();
        }

        let ids: Vec<String> = repo
            .find_by_shop(&shop("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a_1".to_string(), "offline_a".to_string()]);

        assert_eq!(repo.delete_many(&ids).await.unwrap(), 2);
        assert!(repo.load("offline_b").await.unwrap().is_some());
        assert!(!repo.delete("offline_a").await.unwrap());
    }
}
