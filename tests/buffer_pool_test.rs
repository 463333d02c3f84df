//! Buffer Pool Tests
//!
//! Caching, eviction, locking and commit/abort behavior seen through the
//! public API only.

use keeldb::{
    BufferPool, BufferPoolConfig, Catalog, Error, Field, HeapFile, LockMode, PageId, PageStore,
    Permissions, TransactionId, Tuple, TupleDesc, Type,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

struct Fixture {
    pool: BufferPool,
    table: Arc<HeapFile>,
    _dir: tempfile::TempDir,
}

impl Fixture {
    fn pid(&self, page_no: u32) -> PageId {
        PageId::new(self.table.table_id(), page_no)
    }
}

/// One two-int table with `pages` empty pages, behind a pool of `capacity`.
fn create_pool(capacity: usize, pages: u32) -> Fixture {
    let dir = tempdir().unwrap();
    let desc = TupleDesc::with_names(vec![(Type::Int, "id"), (Type::Int, "value")]);
    let table = Arc::new(HeapFile::create(dir.path().join("table.dat"), desc).unwrap());
    for _ in 0..pages {
        table.append_empty_page().unwrap();
    }

    let catalog = Arc::new(Catalog::new());
    catalog.add_table(table.clone());
    let config = BufferPoolConfig::default()
        .with_capacity(capacity)
        .with_lock_timeout(Duration::from_millis(50), Duration::from_millis(100));

    Fixture {
        pool: BufferPool::new(config, catalog),
        table,
        _dir: dir,
    }
}

fn row(id: i32) -> Tuple {
    Tuple::new(vec![Field::Int(id), Field::Int(id * 100)])
}

fn ids(tuples: &[Tuple]) -> Vec<i32> {
    let mut ids: Vec<i32> = tuples
        .iter()
        .map(|t| match t.field(0) {
            Some(Field::Int(v)) => *v,
            other => panic!("unexpected field {other:?}"),
        })
        .collect();
    ids.sort_unstable();
    ids
}

// ============================================================================
// LRU ordering and eviction
// ============================================================================

/// Capacity 2, accesses A, B, C: A is the victim.
#[test]
fn test_lru_victim_is_least_recent() {
    let fx = create_pool(2, 3);
    let tid = TransactionId::new();
    let (a, b, c) = (fx.pid(0), fx.pid(1), fx.pid(2));

    for pid in [a, b, c] {
        fx.pool.get_page(tid, pid, Permissions::ReadOnly).unwrap();
    }

    assert!(!fx.pool.is_cached(a));
    assert!(fx.pool.is_cached(b));
    assert!(fx.pool.is_cached(c));
    assert_eq!(fx.pool.page_count(), 2);
}

/// Eviction passes over dirty pages to the next clean one.
#[test]
fn test_no_steal_skips_dirty_victim() {
    let fx = create_pool(2, 0);
    let writer = TransactionId::new();
    let reader = TransactionId::new();

    let rid = fx.pool.insert_tuple(writer, fx.table.table_id(), row(1)).unwrap();
    fx.table.append_empty_page().unwrap();
    fx.table.append_empty_page().unwrap();

    fx.pool.get_page(reader, fx.pid(1), Permissions::ReadOnly).unwrap();
    fx.pool.get_page(reader, fx.pid(2), Permissions::ReadOnly).unwrap();

    assert_eq!(fx.pool.dirtied_by(rid.page_id), Some(writer));
    assert_eq!(fx.pool.lru_order(), vec![fx.pid(2), rid.page_id]);
}

/// Capacity 1; P1 dirty; fetching P2 cannot evict anything.
#[test]
fn test_eviction_impossible_with_single_dirty_page() {
    let fx = create_pool(1, 1);
    let t1 = TransactionId::new();
    let (p1, p2) = (fx.pid(0), fx.pid(1));

    fx.pool.get_page(t1, p1, Permissions::ReadWrite).unwrap();
    fx.pool.insert_tuple(t1, fx.table.table_id(), row(1)).unwrap();
    assert!(fx.pool.is_dirty(p1));
    fx.table.append_empty_page().unwrap();

    let err = fx.pool.get_page(t1, p2, Permissions::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::EvictionImpossible { dirty: 1, capacity: 1 }));
    assert!(fx.pool.is_dirty(p1));

    // Once committed, P1 is clean and P2 fits.
    fx.pool.commit(t1).unwrap();
    let t2 = TransactionId::new();
    fx.pool.get_page(t2, p2, Permissions::ReadOnly).unwrap();
    assert_eq!(fx.pool.lru_order(), vec![p2]);
}

// ============================================================================
// Page locks through get_page
// ============================================================================

/// T1 holds EXCLUSIVE; T2's SHARED request fails until T1 finishes.
#[test]
fn test_exclusive_denies_shared_until_release() {
    let fx = create_pool(4, 1);
    let (t1, t2) = (TransactionId::new(), TransactionId::new());
    let p1 = fx.pid(0);

    fx.pool.get_page(t1, p1, Permissions::ReadWrite).unwrap();

    let err = fx.pool.get_page(t2, p1, Permissions::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::TransactionAborted { mode: LockMode::Shared, .. }));
    assert!(err.is_retryable());

    fx.pool.commit(t1).unwrap();
    fx.pool.get_page(t2, p1, Permissions::ReadOnly).unwrap();
    assert!(fx.pool.holds_lock(t2, p1));
}

#[test]
fn test_sole_reader_upgrades_in_place() {
    let fx = create_pool(4, 1);
    let tid = TransactionId::new();
    let p = fx.pid(0);

    fx.pool.get_page(tid, p, Permissions::ReadOnly).unwrap();
    fx.pool.get_page(tid, p, Permissions::ReadWrite).unwrap();

    let holders = fx.pool.lock_manager().holders(p);
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].mode, LockMode::Exclusive);
}

#[test]
fn test_upgrade_denied_with_other_readers() {
    let fx = create_pool(4, 1);
    let (t1, t2) = (TransactionId::new(), TransactionId::new());
    let p = fx.pid(0);

    fx.pool.get_page(t1, p, Permissions::ReadOnly).unwrap();
    fx.pool.get_page(t2, p, Permissions::ReadOnly).unwrap();

    let err = fx.pool.get_page(t1, p, Permissions::ReadWrite).unwrap_err();
    assert!(matches!(err, Error::TransactionAborted { mode: LockMode::Exclusive, .. }));

    // T1 keeps its shared lock; it is up to the caller to abort.
    assert_eq!(fx.pool.lock_manager().lock_mode(p, t1), Some(LockMode::Shared));
    fx.pool.abort(t2).unwrap();
    fx.pool.get_page(t1, p, Permissions::ReadWrite).unwrap();
}

// ============================================================================
// Commit and abort
// ============================================================================

#[test]
fn test_commit_makes_rows_durable() {
    let fx = create_pool(4, 0);
    let tid = TransactionId::new();

    for id in 0..3 {
        fx.pool.insert_tuple(tid, fx.table.table_id(), row(id)).unwrap();
    }
    fx.pool.commit(tid).unwrap();

    assert!(!fx.pool.is_dirty(fx.pid(0)));
    assert!(!fx.pool.holds_lock(tid, fx.pid(0)));

    // Disk image holds the rows: read it past the cache.
    let page = fx.table.read_page(fx.pid(0)).unwrap();
    assert_eq!(page.header().tuple_count, 3);
    assert!(page.verify_checksum());
}

#[test]
fn test_abort_discards_inserts() {
    let fx = create_pool(4, 0);
    let setup = TransactionId::new();
    fx.pool.insert_tuple(setup, fx.table.table_id(), row(1)).unwrap();
    fx.pool.commit(setup).unwrap();

    let tid = TransactionId::new();
    fx.pool.insert_tuple(tid, fx.table.table_id(), row(2)).unwrap();
    fx.pool.insert_tuple(tid, fx.table.table_id(), row(3)).unwrap();
    fx.pool.abort(tid).unwrap();

    assert!(!fx.pool.is_dirty(fx.pid(0)));
    assert!(fx.pool.lock_manager().pages_locked_by(tid).is_empty());

    let reader = TransactionId::new();
    assert_eq!(ids(&fx.table.scan(&fx.pool, reader).unwrap()), vec![1]);
}

#[test]
fn test_abort_restores_deleted_row() {
    let fx = create_pool(4, 0);
    let setup = TransactionId::new();
    for id in [10, 20] {
        fx.pool.insert_tuple(setup, fx.table.table_id(), row(id)).unwrap();
    }
    fx.pool.commit(setup).unwrap();

    let tid = TransactionId::new();
    let victim = fx
        .table
        .scan(&fx.pool, tid)
        .unwrap()
        .into_iter()
        .find(|t| t.field(0) == Some(&Field::Int(10)))
        .unwrap();
    fx.pool.delete_tuple(tid, &victim).unwrap();
    assert_eq!(ids(&fx.table.scan(&fx.pool, tid).unwrap()), vec![20]);

    fx.pool.abort(tid).unwrap();
    let reader = TransactionId::new();
    assert_eq!(ids(&fx.table.scan(&fx.pool, reader).unwrap()), vec![10, 20]);
}

#[test]
fn test_locks_released_after_either_outcome() {
    let fx = create_pool(8, 3);
    for commit in [true, false] {
        let tid = TransactionId::new();
        fx.pool.get_page(tid, fx.pid(0), Permissions::ReadOnly).unwrap();
        fx.pool.get_page(tid, fx.pid(1), Permissions::ReadWrite).unwrap();
        fx.pool.insert_tuple(tid, fx.table.table_id(), row(5)).unwrap();

        fx.pool.transaction_complete(tid, commit).unwrap();

        for page_no in 0..3 {
            assert!(!fx.pool.holds_lock(tid, fx.pid(page_no)));
        }
    }
    assert_eq!(fx.pool.lock_manager().locked_page_count(), 0);
}

// ============================================================================
// Tuple routing errors
// ============================================================================

#[test]
fn test_tuple_errors() {
    let fx = create_pool(4, 0);
    let tid = TransactionId::new();

    let wide = Tuple::new(vec![Field::Int(1), Field::Int(2), Field::Int(3)]);
    assert!(matches!(
        fx.pool.insert_tuple(tid, fx.table.table_id(), wide),
        Err(Error::SchemaMismatch { .. })
    ));

    let unknown = keeldb::TableId(fx.table.table_id().0.wrapping_add(1));
    assert!(matches!(
        fx.pool.insert_tuple(tid, unknown, row(1)),
        Err(Error::TableNotFound(_))
    ));

    assert!(matches!(fx.pool.delete_tuple(tid, &row(1)), Err(Error::MissingRecordId)));
}

#[test]
fn test_stats_track_hits_misses_and_writes() {
    let fx = create_pool(4, 2);
    let tid = TransactionId::new();

    fx.pool.get_page(tid, fx.pid(0), Permissions::ReadOnly).unwrap();
    fx.pool.get_page(tid, fx.pid(0), Permissions::ReadOnly).unwrap();
    fx.pool.get_page(tid, fx.pid(1), Permissions::ReadWrite).unwrap();
    fx.pool.insert_tuple(tid, fx.table.table_id(), row(1)).unwrap();
    fx.pool.commit(tid).unwrap();

    let stats = fx.pool.stats().snapshot();
    assert_eq!(stats.cache_misses, 2);
    assert!(stats.cache_hits >= 2);
    assert_eq!(stats.pages_read, 2);
    assert_eq!(stats.pages_written, 1);
    assert_eq!(stats.evictions, 0);
}
