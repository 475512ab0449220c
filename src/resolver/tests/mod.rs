use crate::config::{Config, ProxyConfig};
use crate::downloader::DriveDownloader;
use crate::downloader::test_helpers::{
    create_test_downloader, drain_events, file, folder, folder_page_with, mount_folder,
    test_config,
};
use crate::error::{Error, ResolveError};
use crate::types::{Event, RemoteNode};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn folder_url(server: &MockServer, id: &str) -> String {
    format!("{}/drive/folders/{}", server.uri(), id)
}

fn downloader_with(server: &MockServer, adjust: impl FnOnce(&mut Config)) -> DriveDownloader {
    let mut config = test_config(server);
    adjust(&mut config);
    DriveDownloader::new(config).unwrap()
}

#[tokio::test]
async fn resolves_flat_folder() {
    let server = MockServer::start().await;
    mount_folder(
        &server,
        "root",
        "Reports",
        &[file("f1", "a.txt"), file("f2", "b.txt")],
    )
    .await;
    let downloader = create_test_downloader(&server);

    let tree = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    assert_eq!(tree.id, "root");
    assert_eq!(tree.name, "Reports");
    assert!(tree.is_folder());
    let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
    assert_eq!(tree.children[0].id, "f1");
    assert_eq!(tree.children[0].mime_type, "text/plain");
}

#[tokio::test]
async fn resolves_nested_folders_in_listing_order() {
    let server = MockServer::start().await;
    mount_folder(
        &server,
        "root",
        "Root",
        &[folder("a", "folderA"), file("y", "fileY"), folder("b", "folderB")],
    )
    .await;
    mount_folder(&server, "a", "folderA", &[file("x", "fileX")]).await;
    mount_folder(&server, "b", "folderB", &[]).await;
    let downloader = create_test_downloader(&server);

    let tree = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    let expected = RemoteNode::folder("root", "Root")
        .with_child(
            RemoteNode::folder("a", "folderA").with_child(RemoteNode::file(
                "x",
                "fileX",
                "text/plain",
            )),
        )
        .with_child(RemoteNode::file("y", "fileY", "text/plain"))
        .with_child(RemoteNode::folder("b", "folderB"));
    assert_eq!(tree, expected);
    assert_eq!(tree.file_count(), 2);
}

#[tokio::test]
async fn subfolder_name_comes_from_its_own_page() {
    let server = MockServer::start().await;
    mount_folder(&server, "root", "Root", &[folder("a", "listed name")]).await;
    mount_folder(&server, "a", "Page Title", &[]).await;
    let downloader = create_test_downloader(&server);

    let tree = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    assert_eq!(tree.children[0].id, "a");
    assert_eq!(tree.children[0].name, "Page Title");
}

#[tokio::test]
async fn null_child_list_is_empty_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/empty"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(folder_page_with("Nothing Here - Google Drive", None)),
        )
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    let tree = downloader
        .resolve_folder(&folder_url(&server, "empty"))
        .await
        .unwrap();

    assert_eq!(tree.name, "Nothing Here");
    assert!(tree.children.is_empty());
}

#[tokio::test]
async fn unicode_names_survive_both_decoding_stages() {
    let server = MockServer::start().await;
    mount_folder(
        &server,
        "root",
        "Fotos",
        &[file("f1", "日本語.txt"), file("f2", "café \"quoted\".md")],
    )
    .await;
    let downloader = create_test_downloader(&server);

    let tree = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    assert_eq!(tree.children[0].name, "日本語.txt");
    assert_eq!(tree.children[1].name, "café \"quoted\".md");
}

#[tokio::test]
async fn redirect_refetches_final_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", folder_url(&server, "new")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/new"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(folder_page_with("Moved - Google Drive", Some(&[]))),
        )
        .expect(2)
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    let tree = downloader
        .resolve_folder(&folder_url(&server, "old"))
        .await
        .unwrap();

    // Root id is taken from the canonical URL
    assert_eq!(tree.id, "new");
    assert_eq!(tree.name, "Moved");
}

#[tokio::test]
async fn no_redirect_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/root"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(folder_page_with("Once - Google Drive", Some(&[]))),
        )
        .expect(1)
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();
}

#[tokio::test]
async fn requests_go_through_proxy_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(
            r"^/https:/+drive\.google\.com/drive/folders/remote$",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(folder_page_with("Proxied - Google Drive", Some(&[]))),
        )
        .expect(1)
        .mount(&server)
        .await;
    let downloader = downloader_with(&server, |config| {
        config.proxy = ProxyConfig {
            prefix: Some(server.uri()),
        };
    });

    let tree = downloader
        .resolve_folder("https://drive.google.com/drive/folders/remote")
        .await
        .unwrap();

    assert_eq!(downloader.proxy_prefix(), format!("{}/", server.uri()));
    assert_eq!(tree.id, "remote");
    assert_eq!(tree.name, "Proxied");
}

#[tokio::test]
async fn missing_payload_is_data_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/root"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Sign in - Google Accounts</title></head></html>",
        ))
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    let err = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Resolve(ResolveError::DataNotFound { .. })
    ));
    assert_eq!(err.code(), "data_not_found");
}

#[tokio::test]
async fn error_status_page_is_data_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    let err = downloader
        .resolve_folder(&folder_url(&server, "gone"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Resolve(ResolveError::DataNotFound { .. })
    ));
}

#[tokio::test]
async fn title_without_separator_is_title_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/root"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(folder_page_with("Untitled", Some(&[]))),
        )
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    let err = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap_err();

    match err {
        Error::Resolve(ResolveError::TitleParse { title }) => assert_eq!(title, "Untitled"),
        other => panic!("expected TitleParse, got {:?}", other),
    }
}

#[tokio::test]
async fn failing_subfolder_aborts_resolution() {
    let server = MockServer::start().await;
    mount_folder(
        &server,
        "root",
        "Root",
        &[folder("bad", "Broken"), folder("never", "Never")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/bad"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let downloader = create_test_downloader(&server);

    let result = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await;

    assert!(matches!(
        result,
        Err(Error::Resolve(ResolveError::DataNotFound { .. }))
    ));
}

#[tokio::test]
async fn child_count_at_limit_warns_but_succeeds() {
    let server = MockServer::start().await;
    mount_folder(
        &server,
        "root",
        "Full",
        &[file("f1", "1.txt"), file("f2", "2.txt")],
    )
    .await;
    let downloader = downloader_with(&server, |config| config.resolver.max_children = 2);
    let mut events = downloader.subscribe();

    let tree = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    assert_eq!(tree.children.len(), 2);
    let limit_events: Vec<_> = drain_events(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            Event::ChildLimitReached { folder_id, count } => Some((folder_id, count)),
            _ => None,
        })
        .collect();
    assert_eq!(limit_events.len(), 1);
    assert_eq!(limit_events[0].0, "root");
    assert_eq!(limit_events[0].1, 2);
}

#[tokio::test]
async fn child_count_below_limit_or_unbounded_is_silent() {
    let server = MockServer::start().await;
    mount_folder(&server, "root", "Full", &[file("f1", "1.txt")]).await;

    let below = downloader_with(&server, |config| config.resolver.max_children = 2);
    let unbounded = downloader_with(&server, |config| {
        config.resolver.max_children = 1;
        config.resolver.allow_unbounded_children = true;
    });

    for downloader in [below, unbounded] {
        let mut events = downloader.subscribe();
        downloader
            .resolve_folder(&folder_url(&server, "root"))
            .await
            .unwrap();
        assert!(
            !drain_events(&mut events)
                .iter()
                .any(|e| matches!(e, Event::ChildLimitReached { .. }))
        );
    }
}

#[tokio::test]
async fn nesting_beyond_max_depth_fails() {
    let server = MockServer::start().await;
    mount_folder(&server, "root", "Root", &[folder("a", "A")]).await;
    mount_folder(&server, "a", "A", &[folder("b", "B")]).await;
    mount_folder(&server, "b", "B", &[]).await;
    let downloader = downloader_with(&server, |config| config.resolver.max_depth = 1);

    let err = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap_err();

    match err {
        Error::Resolve(ResolveError::DepthExceeded {
            folder_id,
            max_depth,
        }) => {
            assert_eq!(folder_id, "b");
            assert_eq!(max_depth, 1);
        }
        other => panic!("expected DepthExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn discovery_events_follow_listing_order() {
    let server = MockServer::start().await;
    mount_folder(
        &server,
        "root",
        "Root",
        &[folder("a", "A"), file("y", "y.txt")],
    )
    .await;
    mount_folder(&server, "a", "A", &[file("x", "x.txt")]).await;
    let downloader = create_test_downloader(&server);
    let mut events = downloader.subscribe();

    downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    let seen: Vec<String> = drain_events(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            Event::FolderDiscovered { name, .. } => Some(format!("folder:{}", name)),
            Event::FileDiscovered { name, .. } => Some(format!("file:{}", name)),
            _ => None,
        })
        .collect();
    assert_eq!(seen, ["folder:A", "file:x.txt", "file:y.txt"]);
}

#[tokio::test]
async fn quiet_mode_suppresses_discovery_events() {
    let server = MockServer::start().await;
    mount_folder(&server, "root", "Root", &[folder("a", "A")]).await;
    mount_folder(&server, "a", "A", &[file("x", "x.txt")]).await;
    let downloader = downloader_with(&server, |config| config.resolver.quiet = true);
    let mut events = downloader.subscribe();

    let tree = downloader
        .resolve_folder(&folder_url(&server, "root"))
        .await
        .unwrap();

    assert_eq!(tree.file_count(), 1);
    assert!(drain_events(&mut events).is_empty());
}
