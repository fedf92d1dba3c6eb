// Integration tests for the on-disk proxy cache

use anyhow::Result;
use std::fs;
use tempfile::TempDir;

use vpn_share_libproxy::ProxyCache;

#[test]
fn test_save_then_load_contains_exact_pair() -> Result<()> {
    let dir = TempDir::new()?;
    let cache = ProxyCache::at(dir.path().join("vpn-share-tool/libproxy_cache.json"));

    cache.save("http://a.corp", "http://192.168.1.2:9000")?;
    cache.save("http://b.corp", "http://192.168.1.3:9000")?;
    cache.save("http://intranet.corp:8080", "http://192.168.1.5:9001")?;

    let entries = cache.load();
    assert_eq!(
        entries.get("http://intranet.corp:8080").map(String::as_str),
        Some("http://192.168.1.5:9001")
    );
    assert_eq!(entries.len(), 3, "existing entries are merged, not replaced");
    Ok(())
}

#[test]
fn test_file_is_single_json_object() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("libproxy_cache.json");
    let cache = ProxyCache::at(&path);

    cache.save("http://a.corp", "http://p:1")?;
    cache.save("http://b.corp", "http://p:2")?;

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let object = value.as_object().expect("cache file should be a JSON object");
    assert_eq!(object["http://a.corp"], "http://p:1");
    assert_eq!(object["http://b.corp"], "http://p:2");
    Ok(())
}

#[test]
fn test_entries_written_by_another_process_are_kept() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("libproxy_cache.json");
    fs::write(&path, r#"{"http://legacy.corp": "http://192.168.0.4:7000"}"#)?;

    let cache = ProxyCache::at(&path);
    cache.save("http://new.corp", "http://192.168.0.5:7000")?;

    let entries = cache.load();
    assert_eq!(entries["http://legacy.corp"], "http://192.168.0.4:7000");
    assert_eq!(entries["http://new.corp"], "http://192.168.0.5:7000");
    Ok(())
}

#[test]
fn test_unreadable_cache_never_errors() -> Result<()> {
    let dir = TempDir::new()?;
    // A directory where the file should be: reading fails, load stays empty.
    let path = dir.path().join("libproxy_cache.json");
    fs::create_dir_all(&path)?;

    let cache = ProxyCache::at(&path);
    assert!(cache.load().is_empty());
    assert!(cache.lookup("http://a.corp").is_none());
    Ok(())
}
