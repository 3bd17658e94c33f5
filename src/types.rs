use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// The `xcodebuild` action a task performs.
///
/// Every variant except `Export` maps to a positional action word; `Export`
/// is spelled `-exportArchive` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Build,
    Test,
    Clean,
    Archive,
    Export,
    BuildForTesting,
    TestWithoutBuilding,
}

impl Default for Action {
    fn default() -> Self {
        Action::Build
    }
}

impl Action {
    /// The token passed to `xcodebuild` for this action.
    pub fn as_arg(&self) -> &'static str {
        match self {
            Action::Build => "build",
            Action::Test => "test",
            Action::Clean => "clean",
            Action::Archive => "archive",
            Action::Export => "-exportArchive",
            Action::BuildForTesting => "build-for-testing",
            Action::TestWithoutBuilding => "test-without-building",
        }
    }

    /// Whether the action runs tests (and may therefore collect coverage or
    /// filter test identifiers).
    pub fn runs_tests(&self) -> bool {
        matches!(self, Action::Test | Action::TestWithoutBuilding)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Build => "build",
            Action::Test => "test",
            Action::Clean => "clean",
            Action::Archive => "archive",
            Action::Export => "export",
            Action::BuildForTesting => "build-for-testing",
            Action::TestWithoutBuilding => "test-without-building",
        };
        f.write_str(name)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "build" => Ok(Action::Build),
            "test" => Ok(Action::Test),
            "clean" => Ok(Action::Clean),
            "archive" => Ok(Action::Archive),
            "export" | "exportarchive" => Ok(Action::Export),
            "build-for-testing" => Ok(Action::BuildForTesting),
            "test-without-building" => Ok(Action::TestWithoutBuilding),
            other => Err(format!("invalid action: {other}")),
        }
    }
}

/// `PRODUCT_TYPE` values the coverage step cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductType {
    Application,
    Framework,
    UnitTestBundle,
    UiTestBundle,
    /// Anything else, carrying the raw identifier.
    Other(String),
}

pub const PRODUCT_TYPE_APPLICATION: &str = "com.apple.product-type.application";
pub const PRODUCT_TYPE_FRAMEWORK: &str = "com.apple.product-type.framework";
pub const PRODUCT_TYPE_UNIT_TEST: &str = "com.apple.product-type.bundle.unit-test";
pub const PRODUCT_TYPE_UI_TEST: &str = "com.apple.product-type.bundle.ui-testing";

impl ProductType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            PRODUCT_TYPE_APPLICATION => ProductType::Application,
            PRODUCT_TYPE_FRAMEWORK => ProductType::Framework,
            PRODUCT_TYPE_UNIT_TEST => ProductType::UnitTestBundle,
            PRODUCT_TYPE_UI_TEST => ProductType::UiTestBundle,
            other => ProductType::Other(other.to_string()),
        }
    }

    /// Test bundles have no coverage artifact of their own.
    pub fn is_test_bundle(&self) -> bool {
        matches!(self, ProductType::UnitTestBundle | ProductType::UiTestBundle)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProductType::Application => PRODUCT_TYPE_APPLICATION,
            ProductType::Framework => PRODUCT_TYPE_FRAMEWORK,
            ProductType::UnitTestBundle => PRODUCT_TYPE_UNIT_TEST,
            ProductType::UiTestBundle => PRODUCT_TYPE_UI_TEST,
            ProductType::Other(raw) => raw,
        }
    }
}

/// Device SDKs (as opposed to simulators or macOS), matched by prefix so
/// versioned names like `iphoneos17.2` count too.
const DEVICE_SDK_PREFIXES: &[&str] = &["iphoneos", "appletvos", "watchos", "xros"];

pub fn is_device_sdk(sdk: &str) -> bool {
    let sdk = sdk.trim().to_lowercase();
    DEVICE_SDK_PREFIXES.iter().any(|p| sdk.starts_with(p))
}
