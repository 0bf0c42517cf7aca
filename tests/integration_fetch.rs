//! Fragment fetcher integration tests against a mock HTTP server.

use harvid::config::Config;
use harvid::fetch::FragmentFetcher;
use harvid::fragment::FragmentSet;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_fragment(server: &MockServer, url_path: &str, body: &[u8], expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

fn fetcher(fragment_dir: &Path) -> FragmentFetcher {
    FragmentFetcher::new(&Config::default(), fragment_dir.to_path_buf(), "cap")
}

#[tokio::test]
async fn fetch_is_idempotent_across_runs() {
    let server = MockServer::start().await;
    // Each fragment must be transferred exactly once: the second run finds
    // every file on disk and issues zero requests.
    mount_fragment(&server, "/seg/video00001.ts", b"video-one", 1).await;
    mount_fragment(&server, "/seg/video00002.ts", b"video-two", 1).await;
    mount_fragment(&server, "/seg/audio00001.aac", b"audio-one", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let fragment_dir = dir.path().join("fragments");
    let locators = vec![
        format!("{}/seg/video00001.ts", server.uri()),
        format!("{}/seg/video00002.ts", server.uri()),
        format!("{}/seg/audio00001.aac", server.uri()),
    ];

    let first = fetcher(&fragment_dir).fetch_all(&locators).await.unwrap();
    let second = fetcher(&fragment_dir).fetch_all(&locators).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.video.len(), 2);
    assert_eq!(first.audio.len(), 1);
    assert_eq!(
        std::fs::read(fragment_dir.join("cap_00001.ts")).unwrap(),
        b"video-one"
    );
}

#[tokio::test]
async fn fetch_preserves_capture_order_within_each_track() {
    let server = MockServer::start().await;
    // Deliberately out of numeric order; the fetcher must not re-sort.
    mount_fragment(&server, "/seg/part00003.ts", b"three", 1).await;
    mount_fragment(&server, "/seg/part00001.ts", b"one", 1).await;
    mount_fragment(&server, "/seg/part00002.ts", b"two", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let locators = vec![
        format!("{}/seg/part00003.ts", server.uri()),
        format!("{}/seg/part00001.ts", server.uri()),
        format!("{}/seg/part00002.ts", server.uri()),
    ];

    let set = fetcher(dir.path()).fetch_all(&locators).await.unwrap();

    let sequences: Vec<&str> = set.video.iter().map(|f| f.sequence.as_str()).collect();
    assert_eq!(sequences, vec!["00003", "00001", "00002"]);
}

#[tokio::test]
async fn true_duplicate_locators_are_fetched_and_recorded_once() {
    let server = MockServer::start().await;
    mount_fragment(&server, "/seg/part00007.ts", b"seven", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let locator = format!("{}/seg/part00007.ts", server.uri());
    let locators = vec![locator.clone(), locator];

    let set = fetcher(dir.path()).fetch_all(&locators).await.unwrap();

    assert_eq!(set.video.len(), 1);
    assert!(set.audio.is_empty());
}

#[tokio::test]
async fn repeated_locator_survives_resume_without_refetching() {
    let server = MockServer::start().await;
    // A capture naming the same URL twice must still transfer it exactly
    // once in total: the second run finds the file on disk and the repeated
    // occurrence is a plain duplicate, not a stale collision.
    mount_fragment(&server, "/seg/part00007.ts", b"seven", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let locator = format!("{}/seg/part00007.ts", server.uri());
    let locators = vec![locator.clone(), locator];

    let first = fetcher(dir.path()).fetch_all(&locators).await.unwrap();
    let second = fetcher(dir.path()).fetch_all(&locators).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        std::fs::read(dir.path().join("cap_00007.ts")).unwrap(),
        b"seven"
    );
}

#[tokio::test]
async fn aliasing_locator_wins_within_a_single_run() {
    let server = MockServer::start().await;
    // Two distinct locators derive the same path in one fresh run. The
    // arriving fragment is canonical, so only the second is ever fetched
    // and the path's single slot ends up holding its bytes.
    mount_fragment(&server, "/old/seg00001.ts", b"from-old-host", 0).await;
    mount_fragment(&server, "/new/seg00001.ts", b"from-new-host", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let old = format!("{}/old/seg00001.ts", server.uri());
    let new = format!("{}/new/seg00001.ts", server.uri());

    let set = fetcher(dir.path())
        .fetch_all(&[old, new.clone()])
        .await
        .unwrap();

    assert_eq!(set.video.len(), 1);
    assert_eq!(set.video[0].locator, new);
    assert_eq!(
        std::fs::read(dir.path().join("cap_00001.ts")).unwrap(),
        b"from-new-host"
    );
}

#[tokio::test]
async fn stale_file_is_evicted_when_a_new_locator_claims_its_path() {
    let server = MockServer::start().await;
    // Two distinct locators alias to cap_00001.ts. The file left on disk by
    // a previous run belongs to neither this run's first claim nor its
    // second; the arriving fragment is canonical.
    mount_fragment(&server, "/old/seg00001.ts", b"from-old-host", 0).await;
    mount_fragment(&server, "/new/seg00001.ts", b"from-new-host", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let fragment_dir = dir.path().join("fragments");
    std::fs::create_dir_all(&fragment_dir).unwrap();
    std::fs::write(fragment_dir.join("cap_00001.ts"), b"stale-content").unwrap();

    let locators = vec![
        format!("{}/old/seg00001.ts", server.uri()),
        format!("{}/new/seg00001.ts", server.uri()),
    ];

    let set = fetcher(&fragment_dir).fetch_all(&locators).await.unwrap();

    // The path is claimed exactly once and now holds the refetched bytes.
    assert_eq!(set.video.len(), 1);
    assert_eq!(
        std::fs::read(fragment_dir.join("cap_00001.ts")).unwrap(),
        b"from-new-host"
    );
}

#[tokio::test]
async fn transfer_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seg/part00001.ts"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let locators = vec![format!("{}/seg/part00001.ts", server.uri())];

    let err = fetcher(dir.path()).fetch_all(&locators).await.unwrap_err();
    assert!(matches!(err, harvid::Error::Transfer { .. }));
}

#[tokio::test]
async fn digitless_locator_is_rejected_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let locators = vec!["https://cdn/segment.ts".to_string()];

    let err = fetcher(dir.path()).fetch_all(&locators).await.unwrap_err();
    assert!(matches!(err, harvid::Error::Input(_)));
    assert!(err.to_string().contains("https://cdn/segment.ts"));
}

#[tokio::test]
async fn empty_locator_list_yields_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let set = fetcher(dir.path()).fetch_all(&[]).await.unwrap();
    assert_eq!(set, FragmentSet::default());
}
