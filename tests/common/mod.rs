#![allow(dead_code)]

use std::error::Error;

pub use xctask_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;
