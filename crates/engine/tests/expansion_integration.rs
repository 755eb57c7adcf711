//! End-to-end integration tests for the asset engine.
//!
//! These tests verify complete flows work correctly:
//! - Directive expansion against stored and linked assets
//! - Encoding modes and their failure cases
//! - The file allow-list
//! - Manifest-backed stores and render hooks

use std::fs;

use engine::config::Config;
use engine::{
    AssetEngine, AssetError, AssetRecord, EncodingMode, ErrorKind, InMemoryAssetStore,
    RequestContext, Template, MAX_EXPANSION_PASSES,
};
use tempfile::TempDir;

/// Create a test configuration rooted in a temporary directory.
fn create_test_config(allowed_files: Option<&str>) -> (Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.engine.root_directory = temp_dir.path().to_path_buf();
    config.assets.allowed_files = allowed_files.map(String::from);
    (config, temp_dir)
}

fn create_engine(records: Vec<AssetRecord>) -> AssetEngine<InMemoryAssetStore> {
    AssetEngine::from_config(&Config::default(), InMemoryAssetStore::from_records(records))
        .unwrap()
}

// =============================================================================
// Expansion Tests
// =============================================================================

#[tokio::test]
async fn test_text_without_directives_is_unchanged() {
    let engine = create_engine(vec![]);
    let text = "<html>{{title}} {# not an asset} {#assets x}</html>";

    let expansion = engine
        .expand_traced(text, &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(expansion.text, text);
    assert_eq!(expansion.scans, 1);
}

#[tokio::test]
async fn test_expand_stored_asset() {
    let engine = create_engine(vec![AssetRecord::with_content("foo.html", "hello")]);
    let ctx = RequestContext::new();

    assert_eq!(engine.expand("{#asset foo.html}", &ctx).await.unwrap(), "hello");
    assert_eq!(
        engine
            .expand("{#asset foo.html @encoding=base64}", &ctx)
            .await
            .unwrap(),
        "aGVsbG8="
    );
}

#[tokio::test]
async fn test_expand_nested_assets() {
    let engine = create_engine(vec![
        AssetRecord::with_content("a.html", "{#asset b.html}"),
        AssetRecord::with_content("b.html", "hello"),
    ]);

    let expansion = engine
        .expand_traced("{#asset a.html}", &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(expansion.text, "hello");
    assert_eq!(expansion.scans, 2);
}

#[tokio::test]
async fn test_expand_cycle_leaves_partner_directive() {
    let engine = create_engine(vec![
        AssetRecord::with_content("a.html", "{#asset b.html}"),
        AssetRecord::with_content("b.html", "{#asset a.html}"),
    ]);

    let expansion = engine
        .expand_traced("{#asset a.html}", &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(expansion.text, "{#asset b.html}");
    assert_eq!(expansion.scans, MAX_EXPANSION_PASSES + 1);
    assert!(expansion.truncated);
}

#[tokio::test]
async fn test_unknown_asset_fails() {
    let engine = create_engine(vec![AssetRecord::with_content("foo.html", "hello")]);

    let err = engine
        .expand("{#asset foo.html}{#asset nope.html}", &RequestContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AssetError::AssetNotFound { .. }));
    assert!(err.to_string().contains("nope.html"));
    assert_eq!(err.kind(), ErrorKind::Authoring);
}

#[tokio::test]
async fn test_data_uri_requires_image_or_font() {
    let engine = create_engine(vec![
        AssetRecord::with_content("data.json", "{}"),
        AssetRecord::with_content("icon.svg", "<svg/>"),
    ]);
    let ctx = RequestContext::new();

    let err = engine
        .expand("{#asset data.json @encoding=dataURI}", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, AssetError::UnsupportedEncoding { .. }));

    let out = engine
        .expand("<img src=\"{#asset icon.svg @encoding=dataURI}\">", &ctx)
        .await
        .unwrap();
    assert_eq!(out, "<img src=\"data:image/svg+xml;base64,PHN2Zy8+\">");
}

#[tokio::test]
async fn test_invalid_directive_params() {
    let engine = create_engine(vec![AssetRecord::with_content("foo.html", "hello")]);
    let ctx = RequestContext::new();

    for text in [
        "{#asset foo.html @encoding=hex}",
        "{#asset foo.html @charset=utf8}",
        "{#asset foo.html @encoding}",
        "{#asset foo.html @encoding=utf8=x}",
    ] {
        let err = engine.expand(text, &ctx).await.unwrap_err();
        assert!(
            matches!(err, AssetError::InvalidDirective { .. }),
            "{text} gave {err}"
        );
        assert!(err.is_user_facing());
    }
}

#[tokio::test]
async fn test_string_encoding_in_script() {
    let engine = create_engine(vec![AssetRecord::with_content(
        "data.txt",
        "line one\nsays \"hi\"",
    )]);

    let script = engine
        .before_script(
            "const text = \"{#asset data.txt @encoding=string}\";",
            &RequestContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(script, "const text = \"line one\\nsays \\\"hi\\\"\";");
}

// =============================================================================
// Linked File Tests
// =============================================================================

#[tokio::test]
async fn test_linked_file_allowed() {
    let (config, temp_dir) = create_test_config(Some("**/test.html"));
    fs::create_dir_all(temp_dir.path().join("test")).unwrap();
    fs::write(temp_dir.path().join("test/test.html"), [0xEF, 0xBB, 0xBF, b'h', b'i']).unwrap();

    let store =
        InMemoryAssetStore::from_records([AssetRecord::with_link("test.html", "test/test.html")]);
    let engine = AssetEngine::from_config(&config, store).unwrap();
    let ctx = RequestContext::new();

    assert_eq!(engine.expand("{#asset test.html}", &ctx).await.unwrap(), "hi");

    let loaded = engine.resolver().load("test.html", &ctx).await.unwrap();
    assert_eq!(loaded.content, b"hi");
    assert_eq!(loaded.filename, "test.html");
}

#[tokio::test]
async fn test_linked_file_outside_allow_list() {
    let (config, temp_dir) = create_test_config(Some("**/test.html"));
    fs::write(temp_dir.path().join("secret.txt"), "s3cret").unwrap();

    let store =
        InMemoryAssetStore::from_records([AssetRecord::with_link("secret.txt", "secret.txt")]);
    let engine = AssetEngine::from_config(&config, store).unwrap();

    let err = engine
        .expand("{#asset secret.txt}", &RequestContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AssetError::AccessDenied { .. }));
    assert!(err.is_weak());
}

#[tokio::test]
async fn test_disk_access_denied_without_pattern() {
    let (mut config, temp_dir) = create_test_config(None);
    config.assets.search_on_disk_if_not_found_in_store = true;
    fs::write(temp_dir.path().join("page.html"), "<p/>").unwrap();

    let engine = AssetEngine::from_config(&config, InMemoryAssetStore::new()).unwrap();
    let err = engine
        .expand("{#asset page.html}", &RequestContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AssetError::AccessDenied { .. }));
}

#[tokio::test]
async fn test_disk_fallback() {
    let (mut config, temp_dir) = create_test_config(Some("**/*.css"));
    config.assets.search_on_disk_if_not_found_in_store = true;
    fs::create_dir_all(temp_dir.path().join("css")).unwrap();
    fs::write(temp_dir.path().join("css/site.css"), "p{}").unwrap();

    let engine = AssetEngine::from_config(&config, InMemoryAssetStore::new()).unwrap();
    let ctx = RequestContext::new();

    assert_eq!(
        engine.expand("{#asset css/site.css}", &ctx).await.unwrap(),
        "p{}"
    );

    let err = engine
        .expand("{#asset css/missing.css}", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, AssetError::FileNotFound { .. }));
    assert!(err.is_weak());
}

// =============================================================================
// Link Mode Tests
// =============================================================================

#[tokio::test]
async fn test_link_mode_urls() {
    let (mut config, _temp_dir) = create_test_config(None);
    config.assets.local_base_url = Some("http://localhost:5488".to_string());

    let store = InMemoryAssetStore::from_records([
        AssetRecord::with_content("app.js", "run()"),
        AssetRecord::with_link("logo.png", "images/logo.png"),
    ]);
    let engine = AssetEngine::from_config(&config, store).unwrap();

    let out = engine
        .expand(
            "<script src=\"{#asset app.js @encoding=link}\"></script>",
            &RequestContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        out,
        "<script src=\"http://localhost:5488/assets/content/app.js\"></script>"
    );

    let ctx = RequestContext::new().with_http_base_url("https://reports.example.com");
    let out = engine
        .expand("{#asset logo.png @encoding=link}", &ctx)
        .await
        .unwrap();
    assert_eq!(
        out,
        "https://reports.example.com/assets/content/images/logo.png"
    );
}

#[tokio::test]
async fn test_root_url_for_links() {
    let (mut config, _temp_dir) = create_test_config(None);
    config.assets.root_url_for_links = Some("https://cdn.example.com/reports/".to_string());

    let store = InMemoryAssetStore::from_records([AssetRecord::with_content("app.js", "run()")]);
    let engine = AssetEngine::from_config(&config, store).unwrap();

    let asset = engine
        .resolve_asset("app.js", EncodingMode::Link, &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(
        asset.content,
        "https://cdn.example.com/reports/assets/content/app.js"
    );
}

// =============================================================================
// Manifest and Render Hook Tests
// =============================================================================

#[tokio::test]
async fn test_manifest_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("assets.json");

    InMemoryAssetStore::from_records([
        AssetRecord::with_content("header.html", "<h1>{#asset title.txt}</h1>"),
        AssetRecord::with_content("title.txt", "Report"),
    ])
    .save(&manifest)
    .unwrap();

    let store = InMemoryAssetStore::load(&manifest).unwrap();
    let engine = AssetEngine::from_config(&Config::default(), store).unwrap();

    let out = engine
        .expand("{#asset header.html}", &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(out, "<h1>Report</h1>");
}

#[tokio::test]
async fn test_render_pipeline() {
    let engine = create_engine(vec![
        AssetRecord::with_content("format.js", "function fmt(v) { return v }").shared_helper(),
        AssetRecord::with_content("style.css", "h1{}"),
        AssetRecord::with_content("footer.html", "<footer/>"),
    ]);
    let ctx = RequestContext::new();

    let mut template = Template::new("<style>{#asset style.css}</style>{{body}}");
    engine.before_render(&mut template, &ctx).await.unwrap();
    assert_eq!(template.content, "<style>h1{}</style>{{body}}");
    assert_eq!(
        template.helpers.as_text(),
        Some("\nfunction fmt(v) { return v }")
    );

    let output = engine
        .after_render(b"<main/>{#asset footer.html}", &ctx)
        .await
        .unwrap();
    assert_eq!(output, b"<main/><footer/>");
}

#[tokio::test]
async fn test_concurrent_expansions_are_independent() {
    let engine = create_engine(vec![
        AssetRecord::with_content("a.html", "{#asset b.html}"),
        AssetRecord::with_content("b.html", "{#asset a.html}"),
        AssetRecord::with_content("leaf.html", "leaf"),
    ]);
    let ctx = RequestContext::new();

    let results = futures_util::future::join_all(
        (0..8).map(|i| {
            let text = if i % 2 == 0 {
                "{#asset a.html}"
            } else {
                "[{#asset leaf.html}]"
            };
            let engine = &engine;
            let ctx = &ctx;
            async move { engine.expand(text, ctx).await }
        }),
    )
    .await;

    for (i, result) in results.into_iter().enumerate() {
        let expected = if i % 2 == 0 { "{#asset b.html}" } else { "[leaf]" };
        assert_eq!(result.unwrap(), expected);
    }
}
