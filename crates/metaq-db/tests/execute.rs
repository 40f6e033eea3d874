mod common;
use common::*;

use std::error::Error as _;

use bson::doc;
use metaq_db::{
    CompiledQuery, DbError, Document, Executor, MemoryStore, PagedResult, Schema, Storage,
    StorageError,
};
use metaq_query::{CompareOp, Criteria, Query, Sort, Value, parse_query};

fn query(build: impl FnOnce(&mut Criteria)) -> Query {
    let mut criteria = Criteria::new();
    build(&mut criteria);
    Query::new(criteria)
}

fn run(store: &MemoryStore, q: &Query) -> Vec<i64> {
    let rows = executor(store).execute(q).unwrap().into_rows().unwrap();
    ids(&rows)
}

// ── Column criteria ─────────────────────────────────────────────

#[test]
fn unfiltered_returns_all_newest_first() {
    let store = media_store();
    assert_eq!(run(&store, &Query::default()), vec![6, 5, 4, 3, 2, 1]);
    assert_eq!(store.snapshot().len(), MEDIA_COUNT);
}

#[test]
fn equals() {
    let store = media_store();
    let q = query(|c| {
        c.add_equals("media_type", "photo").unwrap();
    });
    assert_eq!(run(&store, &q), vec![5, 3, 1]);
}

#[test]
fn in_and_not_in() {
    let store = media_store();
    let q = query(|c| {
        c.add_in("media_type", ["video", "music"]).unwrap();
    });
    assert_eq!(run(&store, &q), vec![6, 4, 2]);

    let q = query(|c| {
        c.add_not_in("media_author", [1]).unwrap();
    });
    assert_eq!(run(&store, &q), vec![6, 5, 4, 2]);
}

#[test]
fn compare_greater_than() {
    let store = media_store();
    let q = query(|c| {
        c.add_compare("likes", CompareOp::Gt, 5).unwrap();
    });
    assert_eq!(run(&store, &q), vec![6, 4, 2]);
}

#[test]
fn is_null_matches_missing_and_null_fields() {
    let store = media_store();
    let q = query(|c| {
        c.add_compare("media_title", CompareOp::Is, Value::Null).unwrap();
    });
    assert_eq!(run(&store, &q), vec![6, 4]);

    let q = query(|c| {
        c.add_compare("media_title", CompareOp::IsNot, Value::Null).unwrap();
    });
    assert_eq!(run(&store, &q), vec![5, 3, 2, 1]);
}

// ── Meta criteria ───────────────────────────────────────────────

#[test]
fn meta_equals() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("privacy", Some("0".into()), None).unwrap();
    });
    assert_eq!(run(&store, &q), vec![3, 1]);
}

#[test]
fn meta_compare_coerces_numeric_strings() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("privacy", Some(Value::Int(20)), Some(CompareOp::Lte))
            .unwrap();
    });
    assert_eq!(run(&store, &q), vec![3, 2, 1]);
}

#[test]
fn meta_key_only_requires_a_row() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("featured", None, None).unwrap();
    });
    assert_eq!(run(&store, &q), vec![5, 3]);
}

#[test]
fn meta_is_null_matches_entities_without_rows() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("privacy", Some(Value::Null), Some(CompareOp::Is))
            .unwrap();
    });
    assert_eq!(run(&store, &q), vec![6, 4]);
}

#[test]
fn meta_and_column_criteria_combine() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("privacy", Some("0".into()), Some(CompareOp::Eq))
            .unwrap()
            .add_equals("context", "profile")
            .unwrap();
    });
    assert_eq!(run(&store, &q), vec![1]);

    let q = query(|c| {
        c.add_meta_match("featured", None, None)
            .unwrap()
            .add_meta_match("privacy", Some("40".into()), None)
            .unwrap();
    });
    assert_eq!(run(&store, &q), vec![5]);
}

#[test]
fn repeated_meta_values_return_entity_once() {
    let store = media_store();
    let exec = executor(&store);

    let tagged = query(|c| {
        c.add_meta_match("tag", None, None).unwrap();
    });
    assert_eq!(run(&store, &tagged), vec![5, 2, 1]);
    assert_eq!(exec.execute(&tagged.to_count()).unwrap().count(), Some(3));

    let travel = query(|c| {
        c.add_meta_match("tag", Some("travel".into()), None).unwrap();
    });
    assert_eq!(run(&store, &travel), vec![5, 1]);
    assert_eq!(exec.execute(&travel.to_count()).unwrap().count(), Some(2));

    // any row may satisfy it: entity 1 has "beach", entity 5 only "travel"
    let not_travel = query(|c| {
        c.add_meta_match("tag", Some("travel".into()), Some(CompareOp::Ne))
            .unwrap();
    });
    assert_eq!(run(&store, &not_travel), vec![2, 1]);
}

#[test]
fn repeated_meta_values_page_by_entity() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("tag", None, None).unwrap();
    })
    .page(1, 2);
    let result = executor(&store).execute_with_total(&q).unwrap();
    let page = result.page().unwrap();
    assert_eq!(ids(&page.rows), vec![5, 2]);
    let info = page.info.unwrap();
    assert_eq!(info.total_available, Some(3));
    assert_eq!(info.has_more(), Some(true));
}

// ── Count ───────────────────────────────────────────────────────

#[test]
fn count_ignores_pagination() {
    let store = media_store();
    let q = query(|c| {
        c.add_equals("media_type", "photo").unwrap();
    })
    .page(2, 1)
    .count();

    let result = executor(&store).execute(&q).unwrap();
    assert_eq!(result.count(), Some(3));
    assert!(result.rows().is_none());
}

// ── Pagination ──────────────────────────────────────────────────

#[test]
fn second_page_with_total() {
    let store = media_store();
    let q = Query::default().page(2, 2);
    let result = executor(&store).execute_with_total(&q).unwrap();

    let page = result.page().unwrap();
    assert_eq!(ids(&page.rows), vec![4, 3]);
    let info = page.info.unwrap();
    assert_eq!(info.page(), 2);
    assert_eq!(info.returned_count, 2);
    assert_eq!(info.total_available, Some(MEDIA_COUNT as u64));
    assert_eq!(info.total_pages(), Some(3));
    assert_eq!(info.has_more(), Some(true));
}

#[test]
fn last_page_has_no_more() {
    let store = media_store();
    let q = Query::default().page(2, 4);
    let result = executor(&store).execute_with_total(&q).unwrap();
    let page = result.page().unwrap();
    assert_eq!(ids(&page.rows), vec![2, 1]);
    assert_eq!(page.info.unwrap().has_more(), Some(false));
}

#[test]
fn out_of_range_slice_is_clamped() {
    let store = media_store();
    let q = Query::default().slice(-5, 0);
    assert_eq!(run(&store, &q), vec![6]);
}

#[test]
fn offset_without_limit_returns_the_rest() {
    let store = media_store();
    let q = Query {
        offset: Some(4),
        ..Default::default()
    };
    let result = executor(&store).execute(&q).unwrap();
    let page = result.page().unwrap();
    assert_eq!(ids(&page.rows), vec![2, 1]);
    assert!(page.info.is_none());
}

#[test]
fn page_past_the_end_is_empty() {
    let store = media_store();
    let result = executor(&store)
        .execute_with_total(&Query::default().page(10, 5))
        .unwrap();
    let page = result.page().unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.info.unwrap().has_more(), Some(false));
}

// ── Sort ────────────────────────────────────────────────────────

#[test]
fn sort_ascending_by_column() {
    let store = media_store();
    let q = Query::default().sort_by(Sort::asc("likes"));
    assert_eq!(run(&store, &q), vec![3, 5, 1, 4, 6, 2]);
}

#[test]
fn nulls_sort_first_and_ties_keep_id_order() {
    let store = media_store();
    let q = Query::default().sort_by(Sort::asc("media_title"));
    assert_eq!(run(&store, &q), vec![4, 6, 1, 2, 3, 5]);
}

#[test]
fn secondary_sort_breaks_ties() {
    let store = media_store();
    let q = Query::default()
        .sort_by(Sort::asc("media_type"))
        .sort_by(Sort::desc("likes"));
    assert_eq!(run(&store, &q), vec![4, 1, 5, 3, 2, 6]);
}

// ── Schema scope ────────────────────────────────────────────────

#[test]
fn scope_restricts_every_query() {
    let store = media_store();
    let schema = Schema::default().with_scope("blog_id", 1);
    let executor = Executor::new(schema, &store).unwrap();

    let q = query(|c| {
        c.add_equals("media_type", "photo").unwrap();
    });
    let rows = executor.execute(&q).unwrap().into_rows().unwrap();
    assert_eq!(ids(&rows), vec![5, 1]);

    let total = executor.execute(&Query::default().count()).unwrap();
    assert_eq!(total.count(), Some(5));
}

#[test]
fn whitelist_rejects_before_storage_runs() {
    let store = media_store();
    let schema = Schema::default().with_allowed_fields(["media_type"]);
    let executor = Executor::new(schema, &store).unwrap();
    let q = query(|c| {
        c.add_equals("media_author", 1).unwrap();
    });
    assert!(matches!(
        executor.execute(&q),
        Err(DbError::UnsupportedCriterion(_))
    ));
}

// ── Option bag ──────────────────────────────────────────────────

#[test]
fn parsed_options_run_end_to_end() {
    let store = media_store();
    let options = doc! {
        "media_type": "photo",
        "meta_query": [{ "key": "featured" }],
        "order_by": "likes",
        "order": "ASC",
        "per_page": 1_i32,
        "page": 1_i32,
    };
    let q = parse_query(&options).unwrap();
    let result = executor(&store).execute_with_total(&q).unwrap();

    let page = result.page().unwrap();
    assert_eq!(ids(&page.rows), vec![3]);
    assert_eq!(page.info.unwrap().total_available, Some(2));
}

// ── Storage failures ────────────────────────────────────────────

struct Unreachable;

impl Storage for Unreachable {
    fn fetch_rows(&self, _query: &CompiledQuery) -> Result<Vec<Document>, StorageError> {
        Err(StorageError::with_source(
            "connection lost",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer"),
        ))
    }

    fn fetch_count(&self, _query: &CompiledQuery) -> Result<u64, StorageError> {
        Err(StorageError::new("connection lost"))
    }
}

#[test]
fn storage_failure_surfaces_as_storage_error() {
    let executor = Executor::new(Schema::default(), Unreachable).unwrap();

    let err = executor.execute(&Query::default()).unwrap_err();
    let DbError::Storage(inner) = &err else {
        panic!("expected storage error, got {err:?}");
    };
    assert_eq!(inner.message(), "connection lost");
    assert!(inner.source().is_some());

    assert!(matches!(
        executor.execute(&Query::default().count()),
        Err(DbError::Storage(_))
    ));
}

#[test]
fn rows_request_for_count_query_is_refused() {
    let store = media_store();
    let compiled = executor(&store).compile(&Query::default().count()).unwrap();
    assert!(store.fetch_rows(&compiled).is_err());
    assert_eq!(store.fetch_count(&compiled).unwrap(), MEDIA_COUNT as u64);
}

#[test]
fn writes_after_snapshot_are_visible_to_next_query() {
    let store = media_store();
    let q = query(|c| {
        c.add_meta_match("featured", None, None).unwrap();
    });
    assert_eq!(run(&store, &q), vec![5, 3]);

    store.add_attribute(1, "featured", "1").unwrap();
    assert_eq!(run(&store, &q), vec![5, 3, 1]);

    assert!(store.remove(5).unwrap());
    assert_eq!(run(&store, &q), vec![3, 1]);
}

#[test]
fn results_are_owned_documents() {
    let store = media_store();
    let result = executor(&store).execute(&Query::default().slice(0, 1)).unwrap();
    match result {
        PagedResult::Rows(page) => {
            assert_eq!(page.rows[0].get_str("media_type").unwrap(), "video");
        }
        other => panic!("expected rows, got {other:?}"),
    }
}
