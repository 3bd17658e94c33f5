// tests/build_settings.rs
mod common;
use crate::common::{TestResult, init_tracing};

use proptest::prelude::*;
use xctask::settings::{fetch_build_settings, parse_build_settings};
use xctask_test_utils::fake_tool::FakeToolBackend;

const TWO_TARGETS: &str = r#"Command line invocation:
    /usr/bin/xcodebuild test -project App.xcodeproj -scheme App -showBuildSettings

User defaults from command line:
    IDEPackageSupportUseBuiltinSCM = YES

Build settings for action test and target App:
    EXECUTABLE_NAME = App
    OBJROOT = /tmp/dd/Build/Intermediates.noindex
    PRODUCT_TYPE = com.apple.product-type.application
    OTHER_SWIFT_FLAGS = -D DEBUG=1
    EXECUTABLE_NAME = App2

Build settings for action test and target AppTests:
    PRODUCT_TYPE = com.apple.product-type.bundle.unit-test
    TEST_HOST = $(BUILT_PRODUCTS_DIR)/App.app/App
"#;

#[test]
fn two_target_blocks_are_kept_apart() {
    init_tracing();

    let table = parse_build_settings(TWO_TARGETS);

    assert_eq!(table.len(), 2);
    let names: Vec<&str> = table.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["App", "AppTests"]);

    let app = &table["App"];
    assert_eq!(app.len(), 4);
    assert_eq!(app["OBJROOT"], "/tmp/dd/Build/Intermediates.noindex");
    assert_eq!(app["PRODUCT_TYPE"], "com.apple.product-type.application");
    // Value is split at the first '=' only.
    assert_eq!(app["OTHER_SWIFT_FLAGS"], "-D DEBUG=1");
    // Last duplicate wins.
    assert_eq!(app["EXECUTABLE_NAME"], "App2");

    let tests = &table["AppTests"];
    assert_eq!(tests.len(), 2);
    assert_eq!(tests["TEST_HOST"], "$(BUILT_PRODUCTS_DIR)/App.app/App");
    assert!(!tests.contains_key("OBJROOT"));
}

#[test]
fn lines_before_the_first_header_are_dropped() {
    let table = parse_build_settings("FOO = bar\nBuild settings for action test and target X:\n  A = 1\n");
    assert_eq!(table.len(), 1);
    assert_eq!(table["X"].len(), 1);
    assert_eq!(table["X"]["A"], "1");
}

#[test]
fn quoted_target_names_are_unquoted() {
    let table = parse_build_settings("Build settings for action test and target `My App`:\n  A = 1\n");
    assert!(table.contains_key("My App"));
}

#[test]
fn empty_text_yields_empty_table() {
    assert!(parse_build_settings("").is_empty());
}

#[tokio::test]
async fn fetch_runs_show_build_settings_with_the_test_options() -> TestResult {
    init_tracing();

    let backend = FakeToolBackend::new().respond("-showBuildSettings", TWO_TARGETS);
    let options = vec!["-project".to_string(), "App.xcodeproj".to_string()];

    let table = fetch_build_settings(&backend, "/usr/bin/xcodebuild", &options).await?;
    assert_eq!(table.len(), 2);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "/usr/bin/xcodebuild");
    assert_eq!(
        calls[0].args,
        vec!["test", "-project", "App.xcodeproj", "-showBuildSettings"]
    );

    Ok(())
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z_]{0,8}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9/._-]{0,12}"
}

proptest! {
    /// Each block holds exactly the keys written after its header, with the
    /// last value for repeated keys.
    #[test]
    fn blocks_hold_exactly_their_own_pairs(
        blocks in proptest::collection::vec(
            proptest::collection::vec((key_strategy(), value_strategy()), 0..6),
            1..4,
        )
    ) {
        let mut text = String::new();
        for (i, pairs) in blocks.iter().enumerate() {
            text.push_str(&format!("Build settings for action test and target T{i}:\n"));
            for (k, v) in pairs {
                text.push_str(&format!("    {k} = {v}\n"));
            }
            text.push('\n');
        }

        let table = parse_build_settings(&text);
        prop_assert_eq!(table.len(), blocks.len());

        for (i, pairs) in blocks.iter().enumerate() {
            let block = &table[&format!("T{i}")];
            let mut expected = std::collections::HashMap::new();
            for (k, v) in pairs {
                expected.insert(k.clone(), v.clone());
            }
            prop_assert_eq!(block.len(), expected.len());
            for (k, v) in expected {
                prop_assert_eq!(block.get(&k), Some(&v));
            }
        }
    }
}
