#![allow(dead_code)]

use bson::{Document, doc};
use metaq_db::{Bson, Executor, MemoryStore, Schema, StorageError};

pub const MEDIA_COUNT: usize = 6;

/// Six media rows across two blogs with `privacy`, `featured` and
/// multi-valued `tag` attributes.
///
/// | id | type  | context | author | blog | likes | privacy | featured | tag                |
/// |----|-------|---------|--------|------|-------|---------|----------|--------------------|
/// | 1  | photo | profile | 1      | 1    | 5     | "0"     |          | "travel", "beach"  |
/// | 2  | video | profile | 2      | 1    | 12    | "20"    |          | "music"            |
/// | 3  | photo | group   | 1      | 2    | 0     | "0"     | "1"      |                    |
/// | 4  | music | profile | 3      | 1    | 7     |         |          |                    |
/// | 5  | photo | profile | 2      | 1    | 3     | "40"    | "1"      | "travel", "travel" |
/// | 6  | video | group   | 3      | 1    | 9     |         |          |                    |
pub fn media_rows() -> Vec<Document> {
    vec![
        doc! { "id": 1, "media_type": "photo", "context": "profile", "media_author": 1, "blog_id": 1, "likes": 5, "media_title": "Beach" },
        doc! { "id": 2, "media_type": "video", "context": "profile", "media_author": 2, "blog_id": 1, "likes": 12, "media_title": "Concert" },
        doc! { "id": 3, "media_type": "photo", "context": "group", "media_author": 1, "blog_id": 2, "likes": 0, "media_title": "Hike" },
        doc! { "id": 4, "media_type": "music", "context": "profile", "media_author": 3, "blog_id": 1, "likes": 7, "media_title": Bson::Null },
        doc! { "id": 5, "media_type": "photo", "context": "profile", "media_author": 2, "blog_id": 1, "likes": 3, "media_title": "Sunset" },
        doc! { "id": 6, "media_type": "video", "context": "group", "media_author": 3, "blog_id": 1, "likes": 9 },
    ]
}

/// `(media_id, meta_key, meta_value)` rows, in insertion order.
pub fn meta_rows() -> Vec<(i64, &'static str, &'static str)> {
    vec![
        (1, "privacy", "0"),
        (2, "privacy", "20"),
        (3, "privacy", "0"),
        (5, "privacy", "40"),
        (3, "featured", "1"),
        (5, "featured", "1"),
        (1, "tag", "travel"),
        (1, "tag", "beach"),
        (2, "tag", "music"),
        (5, "tag", "travel"),
        (5, "tag", "travel"),
    ]
}

pub fn seed(store: &MemoryStore) -> Result<(), StorageError> {
    store.write(|w| {
        for row in media_rows() {
            w.insert(row)?;
        }
        for (id, key, value) in meta_rows() {
            w.add_attribute(id, key, value)?;
        }
        Ok(())
    })?;
    Ok(())
}

pub fn media_store() -> MemoryStore {
    let store = MemoryStore::new("id");
    seed(&store).unwrap();
    store
}

pub fn executor(store: &MemoryStore) -> Executor<&MemoryStore> {
    Executor::new(Schema::default(), store).unwrap()
}

/// `id` of each row, in order.
pub fn ids(rows: &[Document]) -> Vec<i64> {
    rows.iter()
        .map(|row| match row.get("id") {
            Some(Bson::Int32(n)) => *n as i64,
            Some(Bson::Int64(n)) => *n,
            other => panic!("row without integer id: {other:?}"),
        })
        .collect()
}
