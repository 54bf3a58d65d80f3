use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wsync_engine::error::ErrorKind;
use wsync_engine::{
    CONTENT_MD5_METADATA, ContentTypeResolver, FileErrorKind, Operation, SyncOptions, SyncPhase, SyncProgress,
    WorkspaceSync,
};
use wsync_storage::ETag;
use wsync_storage::backend::MockStore;

const BUCKET: &str = "test-bucket";
const PREFIX: &str = "users/u1/ws/";

fn key(path: &str) -> String {
    format!("{PREFIX}{path}")
}

fn store_with(objects: &[(&str, &str)]) -> Arc<MockStore> {
    Arc::new(MockStore::with_objects(BUCKET, objects.iter().map(|(path, data)| (key(path), data.as_bytes().to_vec()))))
}

fn sync_for(dir: &Path, store: &Arc<MockStore>) -> WorkspaceSync {
    WorkspaceSync::new(SyncOptions::new(BUCKET, PREFIX, dir), store.clone()).unwrap()
}

fn write(dir: &Path, path: &str, data: &str) {
    let path = dir.join(path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

fn read(dir: &Path, path: &str) -> String {
    std::fs::read_to_string(dir.join(path)).unwrap()
}

/// Every regular file under `dir`, relative path → contents.
fn tree(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, files);
            } else {
                files.insert(path.strip_prefix(root).unwrap().to_path_buf(), std::fs::read(&path).unwrap());
            }
        }
    }
    let mut files = BTreeMap::new();
    walk(dir, dir, &mut files);
    files
}

fn paths(paths: &[&str]) -> Vec<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

#[tokio::test]
async fn test_pull_edit_push_scenario() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("a.txt", "hello"), ("sub/b.txt", "world")]);
    let sync = sync_for(workspace.path(), &store);

    let result = sync.pull().await.unwrap();
    assert!(result.success);
    assert_eq!(result.downloaded_files, paths(&["a.txt", "sub/b.txt"]));
    assert_eq!(read(workspace.path(), "a.txt"), "hello");
    assert_eq!(read(workspace.path(), "sub/b.txt"), "world");
    assert_eq!(sync.snapshot_len(), 2);

    write(workspace.path(), "a.txt", "hello2");
    write(workspace.path(), "c.txt", "new");
    let result = sync.push().await.unwrap();
    assert!(result.success);
    assert_eq!(result.uploaded_files, paths(&["a.txt", "c.txt"]));
    assert_eq!(result.skipped_files, paths(&["sub/b.txt"]));
    assert_eq!(store.put_calls(), 2);
    assert_eq!(store.contents(BUCKET, &key("a.txt")).await.unwrap(), b"hello2");
    assert_eq!(store.contents(BUCKET, &key("c.txt")).await.unwrap(), b"new");
    assert_eq!(store.content_type(BUCKET, &key("c.txt")).await.as_deref(), Some("text/plain; charset=utf-8"));
    let metadata = store.metadata(BUCKET, &key("c.txt")).await.unwrap();
    assert_eq!(metadata.get(CONTENT_MD5_METADATA).map(String::as_str), Some("22af645d1859cb5ca6da0c484f1f37ea"));
}

#[tokio::test]
async fn test_round_trip_between_workspaces() {
    let (a, b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    write(a.path(), "README.md", "# workspace");
    write(a.path(), "src/main.ts", "console.log('hi')");
    write(a.path(), "src/deep/nested/data.json", "{}");
    write(a.path(), "empty.txt", "");
    write(a.path(), "server.log", "ignored");
    write(a.path(), "node_modules/pkg/index.js", "ignored");
    let store = store_with(&[]);

    let pushed = sync_for(a.path(), &store).push().await.unwrap();
    assert_eq!(pushed.uploaded_files.len(), 4);
    let pulled = sync_for(b.path(), &store).pull().await.unwrap();
    assert_eq!(pulled.downloaded_files.len(), 4);

    let mut expected = tree(a.path());
    expected.remove(Path::new("server.log"));
    expected.remove(Path::new("node_modules/pkg/index.js"));
    assert_eq!(tree(b.path()), expected);
}

#[tokio::test]
async fn test_second_push_uploads_nothing() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "a.txt", "1");
    write(workspace.path(), "b/c.txt", "2");
    let store = store_with(&[]);
    let sync = sync_for(workspace.path(), &store);

    assert_eq!(sync.push().await.unwrap().uploaded_files.len(), 2);
    let second = sync.push().await.unwrap();
    assert!(second.uploaded_files.is_empty());
    assert_eq!(second.skipped_files.len(), 2);
    assert_eq!(store.put_calls(), 2);
}

#[tokio::test]
async fn test_touched_but_identical_file_is_not_uploaded() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "a.txt", "same");
    let store = store_with(&[]);
    let sync = sync_for(workspace.path(), &store);
    sync.push().await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    write(workspace.path(), "a.txt", "same");
    let result = sync.push().await.unwrap();
    assert!(result.uploaded_files.is_empty());
    assert_eq!(result.skipped_files, paths(&["a.txt"]));
    assert_eq!(store.put_calls(), 1);
}

#[tokio::test]
async fn test_selective_push_in_large_tree() {
    let workspace = TempDir::new().unwrap();
    for i in 0..100 {
        write(workspace.path(), &format!("dir{}/file{i}.txt", i % 7), &format!("content {i}"));
    }
    let store = store_with(&[]);
    let sync = sync_for(workspace.path(), &store);
    assert_eq!(sync.push().await.unwrap().uploaded_files.len(), 100);

    write(workspace.path(), "dir3/file17.txt", "content 17, edited");
    let result = sync.push().await.unwrap();
    assert_eq!(result.uploaded_files, paths(&["dir3/file17.txt"]));
    assert_eq!(result.skipped_files.len(), 99);
}

#[tokio::test]
async fn test_pull_mirrors_remote() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "stale.txt", "gone");
    write(workspace.path(), "old/deeper/file.txt", "gone");
    write(workspace.path(), "kept/other.txt", "gone too");
    let store = store_with(&[("a.txt", "hello"), ("kept/b.txt", "world")]);

    let result = sync_for(workspace.path(), &store).pull().await.unwrap();
    assert!(result.success);
    assert_eq!(result.deleted_files, paths(&["kept/other.txt", "old/deeper/file.txt", "stale.txt"]));
    assert!(!workspace.path().join("old").exists());
    assert!(workspace.path().join("kept").is_dir());
    assert!(workspace.path().is_dir());
    assert_eq!(tree(workspace.path()).len(), 2);
}

#[tokio::test]
async fn test_ignored_files_are_invisible_both_ways() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "debug.log", "local only");
    write(workspace.path(), "node_modules/pkg/index.js", "local only");
    let store = store_with(&[("a.txt", "hello"), ("remote.log", "remote only"), ("dist/bundle.js", "remote only")]);
    let sync = sync_for(workspace.path(), &store);

    let pulled = sync.pull().await.unwrap();
    assert_eq!(pulled.downloaded_files, paths(&["a.txt"]));
    assert!(pulled.deleted_files.is_empty());
    assert!(!workspace.path().join("remote.log").exists());
    assert!(!workspace.path().join("dist").exists());
    assert_eq!(read(workspace.path(), "debug.log"), "local only");
    assert_eq!(read(workspace.path(), "node_modules/pkg/index.js"), "local only");

    let pushed = sync.push().await.unwrap();
    assert!(pushed.uploaded_files.is_empty());
    assert!(store.contents(BUCKET, &key("debug.log")).await.is_none());
}

#[tokio::test]
async fn test_syncignore_and_caller_patterns() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), ".syncignore", "# local secrets\nsecrets/\n!keep.log\n");
    write(workspace.path(), "secrets/key.pem", "private");
    write(workspace.path(), "keep.log", "kept");
    write(workspace.path(), "draft.bak", "caller ignored");
    write(workspace.path(), "a.txt", "hello");
    let store = store_with(&[]);
    let options = SyncOptions::new(BUCKET, PREFIX, workspace.path()).ignore_pattern("*.bak");
    let sync = WorkspaceSync::new(options, store.clone()).unwrap();

    let result = sync.push().await.unwrap();
    assert_eq!(result.uploaded_files, paths(&[".syncignore", "a.txt", "keep.log"]));
}

#[tokio::test]
async fn test_reincluded_file_under_ignored_dir_stays_ignored() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "build/keep.txt", "local edit");
    let store = store_with(&[("build/keep.txt", "remote"), ("a.txt", "hello")]);
    let options = SyncOptions::new(BUCKET, PREFIX, workspace.path()).ignore_patterns(["build/", "!build/keep.txt"]);
    let sync = WorkspaceSync::new(options, store.clone()).unwrap();

    for _ in 0..2 {
        let pulled = sync.pull().await.unwrap();
        assert!(!pulled.downloaded_files.contains(&PathBuf::from("build/keep.txt")));
        assert!(pulled.deleted_files.is_empty());
        assert_eq!(read(workspace.path(), "build/keep.txt"), "local edit");
    }
    assert_eq!(store.get_calls(), 1);

    let pushed = sync.push().await.unwrap();
    assert!(pushed.uploaded_files.is_empty());
    assert_eq!(store.contents(BUCKET, &key("build/keep.txt")).await.as_deref(), Some(&b"remote"[..]));
}

#[tokio::test]
async fn test_escaping_keys_are_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("a/b");
    let store = store_with(&[("ok.txt", "fine"), ("../../escape.txt", "evil"), ("sub/../../../etc/passwd", "evil")]);
    let sync = WorkspaceSync::new(SyncOptions::new(BUCKET, PREFIX, &root), store.clone()).unwrap();

    let result = sync.pull().await.unwrap();
    assert!(!result.success);
    assert_eq!(result.downloaded_files, paths(&["ok.txt"]));
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors.iter().all(|e| e.kind == FileErrorKind::InvalidPath));
    assert!(!temp.path().join("escape.txt").exists());
    assert!(!temp.path().join("etc").exists());
    assert_eq!(store.get_calls(), 1);
}

#[tokio::test]
async fn test_directory_placeholders_are_skipped() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("sub/", ""), ("sub/a.txt", "hello")]);
    let result = sync_for(workspace.path(), &store).pull().await.unwrap();
    assert!(result.success);
    assert_eq!(result.downloaded_files, paths(&["sub/a.txt"]));
}

#[tokio::test]
async fn test_download_concurrency_is_bounded() {
    let workspace = TempDir::new().unwrap();
    let objects: Vec<(String, String)> = (0..10).map(|i| (format!("file{i}.txt"), format!("data {i}"))).collect();
    let objects: Vec<(&str, &str)> = objects.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let store = Arc::new(
        MockStore::with_objects(BUCKET, objects.iter().map(|(path, data)| (key(path), data.as_bytes().to_vec())))
            .with_latency(Duration::from_millis(10)),
    );
    let options = SyncOptions::new(BUCKET, PREFIX, workspace.path()).download_concurrency(2);
    let sync = WorkspaceSync::new(options, store.clone()).unwrap();

    let result = sync.pull().await.unwrap();
    assert_eq!(result.downloaded_files.len(), 10);
    assert_eq!(store.get_calls(), 10);
    assert_eq!(store.max_gets_in_flight(), 2);
}

#[tokio::test]
async fn test_unchanged_files_are_not_downloaded_again() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("a.txt", "hello"), ("b.txt", "world")]);
    let sync = sync_for(workspace.path(), &store);
    sync.pull().await.unwrap();

    let result = sync.pull().await.unwrap();
    assert!(result.downloaded_files.is_empty());
    assert_eq!(result.skipped_files, paths(&["a.txt", "b.txt"]));
    assert_eq!(store.get_calls(), 2);

    // A fresh instance has no snapshot and has to hash, but still downloads nothing.
    let result = sync_for(workspace.path(), &store).pull().await.unwrap();
    assert!(result.downloaded_files.is_empty());
    assert_eq!(store.get_calls(), 2);
}

#[tokio::test]
async fn test_multipart_etag_is_always_downloaded() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("big.bin", "multipart"), ("small.txt", "simple")]);
    let sync = sync_for(workspace.path(), &store);
    sync.pull().await.unwrap();

    let composite = ETag::parse("\"d41d8cd98f00b204e9800998ecf8427e-2\"");
    store.set_etag(BUCKET, &key("big.bin"), composite).await;
    let result = sync.pull().await.unwrap();
    assert_eq!(result.downloaded_files, paths(&["big.bin"]));
    assert_eq!(result.skipped_files, paths(&["small.txt"]));
    assert_eq!(read(workspace.path(), "big.bin"), "multipart");
}

#[tokio::test]
async fn test_changed_remote_content_is_downloaded() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("a.txt", "hello")]);
    let sync = sync_for(workspace.path(), &store);
    sync.pull().await.unwrap();

    // Same size, different content.
    store.insert(BUCKET, &key("a.txt"), "jello").await;
    let result = sync.pull().await.unwrap();
    assert_eq!(result.downloaded_files, paths(&["a.txt"]));
    assert_eq!(read(workspace.path(), "a.txt"), "jello");
}

#[tokio::test]
async fn test_failed_download_does_not_stop_the_batch() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("a.txt", "hello"), ("b.txt", "world"), ("c.txt", "!")]);
    store.fail_key(key("b.txt"));
    let sync = sync_for(workspace.path(), &store);

    let result = sync.pull().await.unwrap();
    assert!(!result.success);
    assert_eq!(result.downloaded_files, paths(&["a.txt", "c.txt"]));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, PathBuf::from("b.txt"));
    assert_eq!(result.errors[0].kind, FileErrorKind::Download);
    assert_eq!(sync.snapshot_len(), 2);
}

#[tokio::test]
async fn test_failed_upload_is_retried_by_next_push() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "a.txt", "1");
    write(workspace.path(), "b.txt", "2");
    let store = store_with(&[]);
    store.fail_key(key("b.txt"));
    let sync = sync_for(workspace.path(), &store);

    let result = sync.push().await.unwrap();
    assert_eq!(result.uploaded_files, paths(&["a.txt"]));
    assert_eq!(result.failed_paths(FileErrorKind::Upload).collect::<Vec<_>>(), vec![Path::new("b.txt")]);

    let healthy = store_with(&[]);
    let sync = sync_for(workspace.path(), &healthy);
    assert_eq!(sync.push().await.unwrap().uploaded_files.len(), 2);
}

#[tokio::test]
async fn test_push_never_deletes_remote_objects() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("a.txt", "hello"), ("b.txt", "world")]);
    let sync = sync_for(workspace.path(), &store);
    sync.pull().await.unwrap();

    std::fs::remove_file(workspace.path().join("b.txt")).unwrap();
    let result = sync.push().await.unwrap();
    assert!(result.uploaded_files.is_empty());
    assert_eq!(store.keys(BUCKET).await, vec![key("a.txt"), key("b.txt")]);
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "local.txt", "untouched");
    let store = store_with(&[("a.txt", "hello")]);
    store.fail_listing(true);

    let err = sync_for(workspace.path(), &store).pull().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Enumeration(_)));
    assert_eq!(read(workspace.path(), "local.txt"), "untouched");
}

#[tokio::test]
async fn test_missing_workspace_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ws");
    let store = store_with(&[]);
    let sync = WorkspaceSync::new(SyncOptions::new(BUCKET, PREFIX, &root), store.clone()).unwrap();
    std::fs::remove_dir(&root).unwrap();

    let err = sync.push().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Enumeration(_)));
}

#[tokio::test]
async fn test_progress_reports_every_phase() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "stale.txt", "gone");
    let store = store_with(&[("a.txt", "hello"), ("b.txt", "world")]);
    let sync = sync_for(workspace.path(), &store);

    let events = Mutex::new(Vec::<SyncProgress>::new());
    sync.pull_with_progress(|event| events.lock().unwrap().push(event)).await.unwrap();
    let events = events.into_inner().unwrap();
    let downloads: Vec<_> = events.iter().filter(|e| e.phase == SyncPhase::Download).collect();
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads.last().map(|e| (e.current, e.total, e.percentage)), Some((2, 2, 100)));
    let cleanup: Vec<_> = events.iter().filter(|e| e.phase == SyncPhase::Cleanup).collect();
    assert_eq!(cleanup.len(), 1);
    assert_eq!(cleanup[0].current_file.as_deref(), Some(Path::new("stale.txt")));

    write(workspace.path(), "c.txt", "new");
    let uploads = Mutex::new(Vec::<SyncProgress>::new());
    sync.push_with_progress(|event| uploads.lock().unwrap().push(event)).await.unwrap();
    let uploads = uploads.into_inner().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].phase, SyncPhase::Upload);
}

#[tokio::test]
async fn test_background_pull() {
    let workspace = TempDir::new().unwrap();
    let store = Arc::new(
        MockStore::with_objects(BUCKET, [(key("a.txt"), "hello"), (key("b.txt"), "world")])
            .with_latency(Duration::from_millis(20)),
    );
    let sync = sync_for(workspace.path(), &store);
    assert!(!sync.is_pull_complete());

    sync.start_background_pull().unwrap();
    let err = sync.pull().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Busy(Operation::Pull)));
    let err = sync.start_background_pull().unwrap_err();
    assert!(matches!(&*err, ErrorKind::Busy(Operation::Pull)));

    let first = sync.wait_for_pull().await.unwrap();
    assert!(sync.is_pull_complete());
    assert_eq!(first.downloaded_files.len(), 2);
    assert_eq!(read(workspace.path(), "a.txt"), "hello");

    let second = sync.wait_for_pull().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.get_calls(), 2);

    // The flag is released once the background pull settles.
    sync.pull().await.unwrap();
}

#[tokio::test]
async fn test_push_is_rejected_during_background_pull() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "c.txt", "new");
    let store =
        Arc::new(MockStore::with_objects(BUCKET, [(key("a.txt"), "hello")]).with_latency(Duration::from_millis(50)));
    let sync = sync_for(workspace.path(), &store);

    sync.start_background_pull().unwrap();
    let err = sync.push().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Busy(Operation::Pull)));

    let pulled = sync.wait_for_pull().await.unwrap();
    assert_eq!(pulled.downloaded_files, paths(&["a.txt"]));
    assert_eq!(pulled.deleted_files, paths(&["c.txt"]));
    assert_eq!(store.put_calls(), 0);

    // Nothing changed locally since the pull, so nothing goes back up.
    let pushed = sync.push().await.unwrap();
    assert!(pushed.uploaded_files.is_empty());
}

#[tokio::test]
async fn test_operations_are_rejected_during_push() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "a.txt", "hello");
    write(workspace.path(), "b.txt", "world");
    let store = Arc::new(
        MockStore::with_objects(BUCKET, Vec::<(String, Vec<u8>)>::new()).with_latency(Duration::from_millis(20)),
    );
    let sync = sync_for(workspace.path(), &store);

    let (first, second, pull) = tokio::join!(sync.push(), sync.push(), sync.pull());
    assert_eq!(first.unwrap().uploaded_files, paths(&["a.txt", "b.txt"]));
    assert!(matches!(&*second.unwrap_err(), ErrorKind::Busy(Operation::Push)));
    assert!(matches!(&*pull.unwrap_err(), ErrorKind::Busy(Operation::Push)));
    assert_eq!(store.put_calls(), 2);

    // Released once the push finished.
    assert!(sync.push().await.unwrap().uploaded_files.is_empty());
}

#[tokio::test]
async fn test_wait_without_background_pull() {
    let workspace = TempDir::new().unwrap();
    let sync = sync_for(workspace.path(), &store_with(&[]));
    let err = sync.wait_for_pull().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::NoBackgroundPull));
}

#[tokio::test]
async fn test_failed_background_pull() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[("a.txt", "hello")]);
    store.fail_listing(true);
    let sync = sync_for(workspace.path(), &store);

    sync.start_background_pull().unwrap();
    let err = sync.wait_for_pull().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::BackgroundPull(_)));
    assert!(sync.is_pull_complete());
    assert!(sync.wait_for_pull().await.is_err());

    store.fail_listing(false);
    assert!(sync.pull().await.unwrap().success);
}

#[tokio::test]
async fn test_custom_content_type() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "page.tpl", "{{ title }}");
    let store = store_with(&[]);
    let resolver =
        ContentTypeResolver::custom(|path| (path.extension()? == "tpl").then(|| "text/x-template".to_string()));
    let options = SyncOptions::new(BUCKET, PREFIX, workspace.path()).content_type_resolver(resolver);
    WorkspaceSync::new(options, store.clone()).unwrap().push().await.unwrap();
    assert_eq!(store.content_type(BUCKET, &key("page.tpl")).await.as_deref(), Some("text/x-template"));
}

#[test]
fn test_construction_errors() {
    let workspace = TempDir::new().unwrap();
    let store = store_with(&[]);
    let build = |options: SyncOptions| WorkspaceSync::new(options, store.clone()).err().map(|e| format!("{:?}", &*e));

    assert!(build(SyncOptions::new("Bad_Bucket", PREFIX, workspace.path())).is_some_and(|e| e.contains("Construction")));
    assert!(build(SyncOptions::new(BUCKET, "", workspace.path())).is_some_and(|e| e.contains("Construction")));
    assert!(build(SyncOptions::new(BUCKET, "../up", workspace.path())).is_some_and(|e| e.contains("Construction")));
    assert!(build(SyncOptions::new(BUCKET, PREFIX, "relative")).is_some_and(|e| e.contains("Construction")));
    assert!(
        build(SyncOptions::new(BUCKET, PREFIX, workspace.path()).upload_concurrency(0))
            .is_some_and(|e| e.contains("Construction"))
    );
    assert!(build(SyncOptions::new(BUCKET, PREFIX, workspace.path()).ignore_pattern("[oops")).is_some_and(|e| e == "Filter"));

    write(workspace.path(), ".syncignore", "ok/\n[broken\n");
    assert!(build(SyncOptions::new(BUCKET, PREFIX, workspace.path())).is_some_and(|e| e == "Filter"));
}

#[test]
fn test_accessors() {
    let workspace = TempDir::new().unwrap();
    let root = workspace.path().join("fresh");
    let sync = WorkspaceSync::new(SyncOptions::new(BUCKET, "users/u1/ws", &root).region("eu-west-1"), store_with(&[]))
        .unwrap();
    assert!(root.is_dir());
    assert_eq!(sync.workspace_path(), root);
    assert_eq!(sync.target().prefix(), PREFIX);
    assert_eq!(sync.target().region(), "eu-west-1");
    assert_eq!(sync.snapshot_len(), 0);
}
