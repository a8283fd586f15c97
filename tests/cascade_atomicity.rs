//! Cascade Atomicity Tests
//!
//! - Destroying a parent with N cascading children removes exactly N + 1
//! - A failed destroy removes nothing
//! - Nested and polymorphic cascades are followed
//! - Non-cascading associations are left alone
//! - Writes landing between planning and committing a destroy never orphan

use std::sync::{Arc, Mutex};

use recordgate::config::RecordGateConfig;
use recordgate::fault::points;
use recordgate::models;
use recordgate::record::{Record, RecordId, RecordRef};
use recordgate::repo::{RepoError, Repository};
use recordgate::schema::ErrorKind;
use recordgate::storage::{
    MemoryStore, RecordStore, ScopePredicate, StorageError, StorageResult,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (Arc<MemoryStore>, Repository) {
    let registry = models::registry().unwrap();
    let store = Arc::new(MemoryStore::for_registry(&registry));
    let repo = Repository::new(
        Arc::new(registry),
        Arc::clone(&store) as Arc<dyn RecordStore>,
        RecordGateConfig::default(),
    );
    (store, repo)
}

fn user(repo: &Repository) -> Record {
    repo.create(
        "user",
        [
            ("name", json!("Author")),
            ("username", json!("author")),
            ("email", json!("author@example.com")),
        ],
    )
    .unwrap()
}

fn project(repo: &Repository) -> Record {
    let group = repo
        .create("group", [("name", json!("GitLab")), ("path", json!("gitlab-org"))])
        .unwrap();
    repo.create(
        "project",
        [
            ("name", json!("GitLab")),
            ("path", json!("gitlab")),
            ("group_id", json!(group.id())),
        ],
    )
    .unwrap()
}

fn issue(repo: &Repository, project: &Record, author: &Record, title: &str) -> Record {
    repo.create(
        "issue",
        [
            ("title", json!(title)),
            ("project_id", json!(project.id())),
            ("author_id", json!(author.id())),
        ],
    )
    .unwrap()
}

fn note(repo: &Repository, issue: &Record, author: &Record) -> Record {
    repo.create(
        "note",
        [
            ("note", json!("+1")),
            ("noteable_type", json!("issue")),
            ("noteable_id", json!(issue.id())),
            ("author_id", json!(author.id())),
        ],
    )
    .unwrap()
}

// =============================================================================
// Cascade Law Tests
// =============================================================================

/// N cascading children: exactly N fewer children and no parent.
#[test]
fn test_cascade_removes_exactly_n_children() {
    let (_store, repo) = setup();
    let author = user(&repo);
    let project = project(&repo);

    for n in 0..5 {
        issue(&repo, &project, &author, &format!("issue {}", n));
    }
    let unrelated = project_in_other_group(&repo);
    issue(&repo, &unrelated, &author, "elsewhere");
    assert_eq!(repo.count("issue").unwrap(), 6);

    let report = repo.destroy(&project).unwrap();

    assert_eq!(report.dependents(), 5);
    assert_eq!(repo.count("issue").unwrap(), 1);
    assert!(repo.find("project", project.id().unwrap()).unwrap().is_none());
    assert_eq!(repo.metrics().snapshot().destroyed, 6);
}

fn project_in_other_group(repo: &Repository) -> Record {
    let group = repo
        .create("group", [("name", json!("Other")), ("path", json!("other"))])
        .unwrap();
    repo.create(
        "project",
        [
            ("name", json!("Other")),
            ("path", json!("other")),
            ("group_id", json!(group.id())),
        ],
    )
    .unwrap()
}

/// Grandchildren, including polymorphic notes, go with the root.
#[test]
fn test_nested_polymorphic_cascade() {
    let (store, repo) = setup();
    let author = user(&repo);
    let project = project(&repo);
    let first = issue(&repo, &project, &author, "first");
    let second = issue(&repo, &project, &author, "second");
    note(&repo, &first, &author);
    note(&repo, &first, &author);
    note(&repo, &second, &author);
    repo.create(
        "project_statistics",
        [("project_id", json!(project.id()))],
    )
    .unwrap();

    let before = store.total().unwrap();
    let report = repo.destroy(&project).unwrap();

    // project, 2 issues, 3 notes, statistics
    assert_eq!(report.count(), 7);
    assert_eq!(store.total().unwrap(), before - 7);
    assert_eq!(repo.count("note").unwrap(), 0);
    assert_eq!(report.destroyed.last(), project.reference().as_ref());

    let position = |r: &Record| {
        report
            .destroyed
            .iter()
            .position(|d| Some(d) == r.reference().as_ref())
            .unwrap()
    };
    assert!(position(&first) < position(&project));
}

/// Owners reached through non-cascading associations survive.
#[test]
fn test_non_cascading_owner_survives() {
    let (_store, repo) = setup();
    let author = user(&repo);
    let project = project(&repo);
    issue(&repo, &project, &author, "mine");

    repo.destroy(&project).unwrap();

    assert!(repo.reload(&author).is_ok());
    assert_eq!(repo.count("user").unwrap(), 1);
}

// =============================================================================
// Failure Atomicity Tests
// =============================================================================

/// A fault midway through a destroy leaves every record in place.
#[test]
fn test_failed_destroy_removes_nothing() {
    let (store, repo) = setup();
    let author = user(&repo);
    let project = project(&repo);
    for n in 0..3 {
        let issue = issue(&repo, &project, &author, &format!("issue {}", n));
        note(&repo, &issue, &author);
    }
    let before = store.total().unwrap();

    store.faults().arm(points::DESTROY_AFTER_FIRST_REMOVE);
    let err = repo.destroy(&project).unwrap_err();

    assert_eq!(err.code(), "RG_CASCADE_DELETE_FAILURE");
    assert_eq!(store.total().unwrap(), before);
    assert!(repo.reload(&project).is_ok());
    assert_eq!(repo.count("issue").unwrap(), 3);
    assert_eq!(repo.count("note").unwrap(), 3);
    assert_eq!(repo.metrics().snapshot().cascade_failures, 1);

    store.faults().disarm_all();
    let report = repo.destroy(&project).unwrap();
    assert_eq!(report.count(), 7);
}

/// Destroying an already destroyed record fails and changes nothing.
#[test]
fn test_destroy_twice() {
    let (store, repo) = setup();
    let project = project(&repo);
    repo.destroy(&project).unwrap();
    let before = store.total().unwrap();

    let err = repo.destroy(&project).unwrap_err();
    assert_eq!(err.code(), "RG_CASCADE_DELETE_FAILURE");
    assert_eq!(store.total().unwrap(), before);
}

/// A fault before commit write leaves the record unsaved.
#[test]
fn test_failed_commit_persists_nothing() {
    let (store, repo) = setup();
    store.faults().arm(points::COMMIT_BEFORE_WRITE);

    let mut group = repo
        .build("group", [("name", json!("g")), ("path", json!("g"))])
        .unwrap();
    let err = repo.save(&mut group).unwrap_err();

    assert_eq!(err.code(), "RG_FAULT_INJECTED");
    assert!(group.is_new_record());
    assert_eq!(store.total().unwrap(), 0);
}

// =============================================================================
// Interleaving Tests
// =============================================================================

/// Runs one pending write ahead of the next commit or destroy, as a
/// concurrent writer would between planning and committing.
struct InterleavedStore {
    inner: Arc<MemoryStore>,
    before_destroy: Mutex<Option<Record>>,
    before_commit: Mutex<Option<Vec<RecordRef>>>,
}

impl RecordStore for InterleavedStore {
    fn find(&self, record_type: &str, id: RecordId) -> StorageResult<Option<Record>> {
        self.inner.find(record_type, id)
    }

    fn find_matching(
        &self,
        record_type: &str,
        predicate: &ScopePredicate,
    ) -> StorageResult<Vec<Record>> {
        self.inner.find_matching(record_type, predicate)
    }

    fn count(&self, record_type: &str) -> StorageResult<usize> {
        self.inner.count(record_type)
    }

    fn commit(&self, record: &Record) -> StorageResult<Record> {
        if let Some(refs) = self.before_commit.lock().unwrap().take() {
            self.inner.commit_destroy(&refs).unwrap();
        }
        self.inner.commit(record)
    }

    fn commit_destroy(&self, refs: &[RecordRef]) -> StorageResult<usize> {
        if let Some(child) = self.before_destroy.lock().unwrap().take() {
            self.inner.commit(&child).unwrap();
        }
        self.inner.commit_destroy(refs)
    }
}

fn interleaved() -> (Arc<InterleavedStore>, Repository) {
    let registry = models::registry().unwrap();
    let store = Arc::new(InterleavedStore {
        inner: Arc::new(MemoryStore::for_registry(&registry)),
        before_destroy: Mutex::new(None),
        before_commit: Mutex::new(None),
    });
    let repo = Repository::new(
        Arc::new(registry),
        Arc::clone(&store) as Arc<dyn RecordStore>,
        RecordGateConfig::default(),
    );
    (store, repo)
}

/// A child committed after the cascade set was planned blocks the destroy.
#[test]
fn test_child_committed_during_destroy_is_not_orphaned() {
    let (store, repo) = interleaved();
    let project = project(&repo);
    let late = Record::new("label")
        .with("title", "late")
        .with("color", "#00ff00")
        .with("project_id", json!(project.id()));
    *store.before_destroy.lock().unwrap() = Some(late);

    let err = repo.destroy(&project).unwrap_err();

    assert_eq!(err.code(), "RG_CASCADE_DELETE_FAILURE");
    match err {
        RepoError::CascadeDeleteFailure { source, .. } => {
            assert_eq!(source.code(), "RG_LIVE_DEPENDENT")
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(repo.reload(&project).is_ok());
    assert_eq!(repo.count("label").unwrap(), 1);

    // a fresh plan sees the late child
    let report = repo.destroy(&project).unwrap();
    assert_eq!(report.dependents(), 1);
    assert_eq!(repo.count("label").unwrap(), 0);
    assert!(repo.find("project", project.id().unwrap()).unwrap().is_none());
}

/// A child validated before its parent was destroyed does not commit.
#[test]
fn test_commit_after_parent_destroyed_is_invalid() {
    let (store, repo) = interleaved();
    let project = project(&repo);
    let mut label = repo
        .build(
            "label",
            [
                ("title", json!("stale")),
                ("color", json!("#00ff00")),
                ("project_id", json!(project.id())),
            ],
        )
        .unwrap();
    *store.before_commit.lock().unwrap() = Some(vec![project.reference().unwrap()]);

    let err = repo.save(&mut label).unwrap_err();

    assert!(err.is_invalid());
    assert!(label
        .errors()
        .has("project", ErrorKind::UnresolvedRequiredAssociation));
    assert!(label.is_new_record());
    assert!(repo.find("project", project.id().unwrap()).unwrap().is_none());
    assert_eq!(repo.count("label").unwrap(), 0);
}

/// Storing a record whose cascading parent is gone is refused outright.
#[test]
fn test_store_refuses_dangling_required_key() {
    let (store, repo) = setup();
    let project = project(&repo);
    repo.destroy(&project).unwrap();

    let orphan = Record::new("label")
        .with("title", "orphan")
        .with("color", "#00ff00")
        .with("project_id", json!(project.id()));
    let err = store.commit(&orphan).unwrap_err();

    assert!(matches!(err, StorageError::MissingParent { .. }));
    assert_eq!(err.code(), "RG_MISSING_PARENT");
    assert_eq!(repo.count("label").unwrap(), 0);
}
