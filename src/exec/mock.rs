use super::{Invocation, Output, Runner};
use crate::error::Result;
use std::cell::RefCell;

type Responder = Box<dyn Fn(&[String]) -> Output>;

/// test runner that answers from a closure and records every call
pub(crate) struct MockRunner {
    respond: Responder,
    pub captured: RefCell<Vec<Invocation>>,
    pub interactive: RefCell<Vec<Invocation>>,
    pub interactive_succeeds: bool,
}

impl MockRunner {
    pub fn responding(respond: impl Fn(&[String]) -> Output + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            captured: RefCell::new(Vec::new()),
            interactive: RefCell::new(Vec::new()),
            interactive_succeeds: true,
        }
    }

    /// answer captured calls in order; once the script runs out every call fails
    pub fn scripted(outputs: Vec<Output>) -> Self {
        let queue = RefCell::new(outputs.into_iter());
        Self::responding(move |_| {
            queue
                .borrow_mut()
                .next()
                .unwrap_or_else(|| fail("mock script exhausted"))
        })
    }

    pub fn captured_args(&self) -> Vec<Vec<String>> {
        self.captured
            .borrow()
            .iter()
            .map(|inv| inv.args.clone())
            .collect()
    }
}

impl Runner for MockRunner {
    fn capture(&self, invocation: &Invocation) -> Result<Output> {
        self.captured.borrow_mut().push(invocation.clone());
        Ok((self.respond)(&invocation.args))
    }

    fn interactive(&self, invocation: &Invocation) -> Result<bool> {
        self.interactive.borrow_mut().push(invocation.clone());
        Ok(self.interactive_succeeds)
    }
}

pub(crate) fn ok(stdout: &str) -> Output {
    Output {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub(crate) fn fail(stderr: &str) -> Output {
    Output {
        code: Some(100),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// true when `args` contains every one of `needles`
pub(crate) fn has_args(args: &[String], needles: &[&str]) -> bool {
    needles.iter().all(|n| args.iter().any(|a| a == n))
}
