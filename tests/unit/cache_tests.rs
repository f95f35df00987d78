/*!
 * Tests for the two cache tiers over a real SQLite file
 */

use anyhow::Result;
use std::sync::Arc;

use cuebatch::database::CacheRepository;
use cuebatch::translation::{CacheKey, CacheStore, LookupOutcome, PersistentCache};
use crate::common;

#[tokio::test]
async fn test_cacheStore_withSqliteFile_shouldPersistAcrossStores() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("translate_cache.sqlite");

    {
        let store = CacheStore::with_persistent(Arc::new(CacheRepository::open(&db_path)?));
        store.store("en", "fr", "Good morning", "Bonjour");
        store.flush().await;
    }

    let store = CacheStore::with_persistent(Arc::new(CacheRepository::open(&db_path)?));
    assert_eq!(store.memory_len(), 0);
    match store.lookup("en", "fr", "Good morning").await {
        LookupOutcome::Hit(text) => assert_eq!(text, "Bonjour"),
        LookupOutcome::Miss => panic!("expected a persistent hit"),
    }
    // Promoted into memory by the lookup
    assert_eq!(store.memory_len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cacheStore_withOtherLanguagePair_shouldMiss() -> Result<()> {
    let store = CacheStore::with_persistent(Arc::new(CacheRepository::new_in_memory()?));
    store.store("en", "fr", "Good morning", "Bonjour");
    store.flush().await;

    assert!(matches!(store.lookup("en", "de", "Good morning").await, LookupOutcome::Miss));
    assert!(matches!(store.lookup("auto", "fr", "Good morning").await, LookupOutcome::Miss));
    Ok(())
}

#[tokio::test]
async fn test_cacheRepository_setTwice_shouldReplaceValue() -> Result<()> {
    let repo = CacheRepository::new_in_memory()?;
    let key = CacheKey::new("en", "fr", "Thanks");

    repo.set(&key, "Merci").await?;
    repo.set(&key, "Merci beaucoup").await?;

    assert_eq!(repo.get(&key).await?, Some("Merci beaucoup".to_string()));
    assert_eq!(repo.len().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_cacheRepository_clear_shouldEmptyStore() -> Result<()> {
    let repo = CacheRepository::new_in_memory()?;
    repo.set(&CacheKey::new("en", "fr", "One"), "Un").await?;
    repo.set(&CacheKey::new("en", "fr", "Two"), "Deux").await?;

    assert_eq!(repo.clear().await?, 2);
    assert!(repo.is_empty().await?);
    Ok(())
}
