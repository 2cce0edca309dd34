//! End-to-end document scenarios against the in-memory store

use futures::TryStreamExt;
use objects3::{BulkOptions, DeleteStatus, JsonBucket, MemoryObjectStore};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

const BUCKET: &str = "objects3-test";

fn docs() -> JsonBucket<MemoryObjectStore> {
    JsonBucket::new(MemoryObjectStore::with_bucket(BUCKET), BUCKET)
}

#[test_log::test(tokio::test)]
async fn test_prefix_lifecycle() {
    let docs = docs();
    let keys = ["a/b1.json", "a/b2.json", "a/c3.json"];
    let objects = [json!({ "name": "b1" }), json!({ "name": "b2" }), json!({ "name": "c3" })];
    docs.put_multiple(&keys, &objects, None).await.unwrap();

    // Bodies merged into the listing entries
    let page = docs.get_prefix::<Value>("a/", None).await.unwrap();
    assert_eq!(page.key_count, 3);
    assert!(!page.is_truncated);
    for ((entry, key), object) in page.contents.iter().zip(keys).zip(&objects) {
        assert_eq!(entry.key, key);
        assert_eq!(entry.body.as_ref(), Some(object));
        assert!(!entry.etag.is_empty());
    }

    // Everything removed
    let removed = docs.delete_prefix("a/", None).await.unwrap();
    let deleted: Vec<_> = removed.deleted.iter().map(|d| d.key.as_str()).collect();
    assert_eq!(deleted, keys);
    assert!(removed.errors.is_empty());
    assert!(removed
        .page
        .contents
        .iter()
        .all(|e| e.status == DeleteStatus::Deleted));

    // Second pass is a no-op
    let again = docs.delete_prefix("a/", None).await.unwrap();
    assert!(again.page.contents.is_empty());
    assert!(again.deleted.is_empty());
    assert!(again.errors.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_empty_delete_prefix_serializes_like_the_service() {
    let docs = docs();
    let result = docs.delete_prefix("delete/", None).await.unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "Name": BUCKET,
            "Prefix": "delete/",
            "MaxKeys": 100,
            "KeyCount": 0,
            "IsTruncated": false,
            "Contents": [],
            "CommonPrefixes": [],
            "Deleted": [],
            "Errors": []
        })
    );
}

#[test_log::test(tokio::test)]
async fn test_get_after_put_and_delete() {
    let docs = docs();
    let doc = json!({ "hello": "world", "nested": { "list": [1, 2, 3] } });

    let put = docs.put_one("put/obj1.json", &doc).await.unwrap();
    let fetched = docs.get_one::<Value>("put/obj1.json").await.unwrap().unwrap();
    assert_eq!(fetched.body, doc);
    assert_eq!(fetched.etag, put.etag);

    // Overwrite replaces the whole document
    docs.put_one("put/obj1.json", &json!({ "replaced": true })).await.unwrap();
    let fetched = docs.get_one::<Value>("put/obj1.json").await.unwrap().unwrap();
    assert_eq!(fetched.body, json!({ "replaced": true }));

    let deleted = docs.delete_one("put/obj1.json", None).await.unwrap();
    assert_eq!(deleted.deleted.map(|d| d.key).as_deref(), Some("put/obj1.json"));
    assert!(docs.get_one::<Value>("put/obj1.json").await.unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_manual_pagination_with_tokens() {
    let docs = docs();
    let keys: Vec<String> = (0..5).map(|i| format!("page/{}.json", i)).collect();
    let objects: Vec<Value> = (0..5).map(|i| json!({ "i": i })).collect();
    docs.put_multiple(&keys, &objects, None).await.unwrap();

    let first = docs
        .get_prefix::<Value>("page/", Some(&BulkOptions::new().with_max_keys(3)))
        .await
        .unwrap();
    assert!(first.is_truncated);
    assert_eq!(first.key_count, 3);
    let token = first.next_continuation_token.clone().unwrap();

    let second = docs
        .get_prefix::<Value>(
            "page/",
            Some(&BulkOptions::new().with_max_keys(3).with_continuation_token(token)),
        )
        .await
        .unwrap();
    assert!(!second.is_truncated);
    assert_eq!(second.key_count, 2);

    let bodies: Vec<Value> = first
        .contents
        .into_iter()
        .chain(second.contents)
        .filter_map(|e| e.body)
        .collect();
    assert_eq!(bodies, objects);
}

#[test_log::test(tokio::test)]
async fn test_delete_prefix_one_page_per_call() {
    let docs = docs().with_defaults(BulkOptions::new().with_max_keys(2));
    let keys: Vec<String> = (0..5).map(|i| format!("bulk/{}.json", i)).collect();
    let objects: Vec<Value> = keys.iter().map(|k| json!(k)).collect();
    docs.put_multiple(&keys, &objects, None).await.unwrap();

    let mut calls = 0;
    loop {
        let result = docs.delete_prefix("bulk/", None).await.unwrap();
        calls += 1;
        assert!(result.deleted.len() <= 2);
        if result.page.contents.is_empty() {
            break;
        }
    }

    assert_eq!(calls, 4);
    assert!(docs.store().is_empty(BUCKET));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_pages_cover_prefix_exactly_once(
        names in prop::collection::btree_set("[a-z]{1,3}(/[a-z]{1,2})?", 0..40),
        page_size in 1usize..12,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let listed: Vec<String> = runtime.block_on(async {
            let docs = docs();
            let keys: Vec<String> = names.iter().map(|n| format!("p/{}", n)).collect();
            let objects = vec![json!(null); keys.len()];
            docs.put_multiple(&keys, &objects, None).await.unwrap();
            docs.put_one("q/outside", &json!(null)).await.unwrap();

            let pages: Vec<_> = docs
                .list_pages("p/", Some(&BulkOptions::new().with_max_keys(page_size)))
                .try_collect()
                .await
                .unwrap();
            for page in &pages {
                assert!(page.key_count <= page_size);
            }
            pages.iter().flat_map(|p| p.keys()).collect()
        });

        let expected: Vec<String> = names.iter().map(|n| format!("p/{}", n)).collect();
        let unique = listed.iter().collect::<HashSet<_>>().len();
        prop_assert_eq!(unique, listed.len());
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn prop_delimited_pages_cover_groups_once(
        names in prop::collection::btree_set("[a-c]{1,2}(/[a-z]{1,2}){0,2}", 1..30),
        page_size in 1usize..6,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (objects, prefixes) = runtime.block_on(async {
            let docs = docs();
            let keys: Vec<String> = names.iter().cloned().collect();
            let values = vec![json!(0); keys.len()];
            docs.put_multiple(&keys, &values, None).await.unwrap();

            let options = BulkOptions::new().with_max_keys(page_size).with_delimiter("/");
            let pages: Vec<_> = docs.list_pages("", Some(&options)).try_collect().await.unwrap();
            let objects: Vec<String> = pages.iter().flat_map(|p| p.keys()).collect();
            let prefixes: Vec<String> = pages
                .iter()
                .flat_map(|p| p.common_prefixes.iter().map(|c| c.prefix.clone()))
                .collect();
            (objects, prefixes)
        });

        let expected_objects: Vec<String> = names.iter().filter(|n| !n.contains('/')).cloned().collect();
        let mut expected_prefixes: Vec<String> = names
            .iter()
            .filter_map(|n| n.split_once('/').map(|(head, _)| format!("{}/", head)))
            .collect();
        expected_prefixes.dedup();

        prop_assert_eq!(objects, expected_objects);
        prop_assert_eq!(prefixes, expected_prefixes);
    }
}
