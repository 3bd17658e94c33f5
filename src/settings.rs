// src/settings.rs

//! Parsing of `xcodebuild -showBuildSettings` output.
//!
//! The text looks like:
//!
//! ```text
//! Build settings for action test and target App:
//!     EXECUTABLE_NAME = App
//!     OBJROOT = /Users/me/DerivedData/App/Build/Intermediates.noindex
//!
//! Build settings for action test and target AppTests:
//!     PRODUCT_TYPE = com.apple.product-type.bundle.unit-test
//! ```

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, trace};

use crate::errors::Result;
use crate::exec::ToolBackend;

/// Target name -> (setting -> value). Targets keep first-appearance order.
pub type BuildSettingsTable = IndexMap<String, IndexMap<String, String>>;

static TARGET_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*Build settings for action \S+ and target (.+):\s*$")
        .expect("target header regex is valid")
});

/// Flag appended to the test options to make `xcodebuild` print settings
/// instead of building.
pub const SHOW_BUILD_SETTINGS_FLAG: &str = "-showBuildSettings";

/// Parse settings text into a per-target table.
///
/// Lines before the first target header, and lines that are not
/// `KEY = value`, are skipped. A repeated key within one target keeps the
/// last value.
pub fn parse_build_settings(text: &str) -> BuildSettingsTable {
    let mut table = BuildSettingsTable::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(caps) = TARGET_HEADER.captures(line) {
            let name = unquote(caps[1].trim()).to_string();
            table.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(target) = current.as_ref() else {
            trace!(line, "settings line outside any target block; skipped");
            continue;
        };

        let Some((key, value)) = line.split_once('=') else {
            trace!(line, "settings line without '='; skipped");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        if let Some(settings) = table.get_mut(target) {
            settings.insert(key.to_string(), value.trim().to_string());
        }
    }

    table
}

/// Run `<xcodebuild> test <options...> -showBuildSettings` and parse it.
pub async fn fetch_build_settings(
    backend: &dyn ToolBackend,
    xcodebuild: &str,
    options: &[String],
) -> Result<BuildSettingsTable> {
    let mut args = Vec::with_capacity(options.len() + 2);
    args.push("test".to_string());
    args.extend(options.iter().cloned());
    args.push(SHOW_BUILD_SETTINGS_FLAG.to_string());

    let text = backend.capture(xcodebuild, &args).await?;
    let table = parse_build_settings(&text);

    debug!(targets = ?table.keys().collect::<Vec<_>>(), "parsed build settings");
    Ok(table)
}

/// Strip one layer of surrounding backticks or quotes.
pub(crate) fn unquote(s: &str) -> &str {
    for q in ['`', '"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)) {
            return inner;
        }
    }
    s
}
