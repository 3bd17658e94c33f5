use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use xctask::errors::Result;
use xctask::exec::ToolBackend;

/// One recorded `capture` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub program: String,
    pub args: Vec<String>,
}

/// A fake tool backend that:
/// - answers with canned text chosen by an argument the call contains
///   (e.g. `"-showBuildSettings"`, `"report"`, `"show"`)
/// - records every call for later assertions.
///
/// Calls that match no response get empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeToolBackend {
    responses: Vec<(String, String)>,
    calls: Arc<Mutex<Vec<CapturedCall>>>,
}

impl FakeToolBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, when_arg: &str, output: &str) -> Self {
        self.responses.push((when_arg.to_string(), output.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolBackend for FakeToolBackend {
    fn capture<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(CapturedCall {
                program: program.to_string(),
                args: args.to_vec(),
            });

            let output = self
                .responses
                .iter()
                .find(|(needle, _)| args.iter().any(|a| a == needle))
                .map(|(_, out)| out.clone())
                .unwrap_or_default();

            Ok(output)
        })
    }
}
