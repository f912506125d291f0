use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::config::CloudOcrConfig;

enum Reply {
    Text(&'static str),
    Empty,
    Unconfigured,
    Timeout,
}

struct StubBackend {
    name: &'static str,
    reply: Reply,
    calls: Rc<Cell<usize>>,
}

impl StubBackend {
    fn boxed(name: &'static str, reply: Reply) -> (Box<dyn OcrBackend>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let backend = Self {
            name,
            reply,
            calls: Rc::clone(&calls),
        };
        (Box::new(backend), calls)
    }
}

impl OcrBackend for StubBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn recognize(&self, _image: &[u8]) -> std::result::Result<String, OcrError> {
        self.calls.set(self.calls.get() + 1);
        match self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Empty => Ok("  \n".to_string()),
            Reply::Unconfigured => Err(OcrError::Unconfigured(self.name.to_string())),
            Reply::Timeout => Err(OcrError::Timeout {
                backend: self.name.to_string(),
                seconds: 120,
            }),
        }
    }
}

#[test]
fn first_non_empty_result_wins() {
    let (cloud, cloud_calls) = StubBackend::boxed("cloud", Reply::Text("第2章 线性表"));
    let (local, local_calls) = StubBackend::boxed("local", Reply::Text("unused"));
    let chain = OcrChain::new(vec![cloud, local]);

    let text = chain.recognize(b"png").expect("cloud answers");

    assert_eq!(text, "第2章 线性表");
    assert_eq!(cloud_calls.get(), 1);
    assert_eq!(local_calls.get(), 0);
}

#[test]
fn unconfigured_and_empty_backends_fall_through() {
    let (cloud, _) = StubBackend::boxed("cloud", Reply::Unconfigured);
    let (blank, _) = StubBackend::boxed("blank", Reply::Empty);
    let (local, local_calls) = StubBackend::boxed("local", Reply::Text("栈和队列"));
    let chain = OcrChain::new(vec![cloud, blank, local]);

    assert_eq!(chain.recognize(b"png").expect("local answers"), "栈和队列");
    assert_eq!(local_calls.get(), 1);
    assert_eq!(chain.backend_names(), vec!["cloud", "blank", "local"]);
}

#[test]
fn exhausted_chain_lists_every_attempt() {
    let (cloud, _) = StubBackend::boxed("cloud", Reply::Timeout);
    let (local, _) = StubBackend::boxed("local", Reply::Empty);
    let chain = OcrChain::new(vec![cloud, local]);

    let error = chain.recognize(b"png").expect_err("nothing recognized");

    match error {
        PrepError::AllOcrBackendsUnavailable { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0], "cloud timed out after 120s");
            assert_eq!(attempts[1], "local: empty result");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_chain_is_unavailable() {
    let chain = OcrChain::new(Vec::new());

    let error = chain.recognize(b"png").expect_err("no backends");

    assert!(matches!(
        error,
        PrepError::AllOcrBackendsUnavailable { ref attempts } if attempts.len() == 1
    ));
}

#[test]
fn cloud_backend_without_key_is_unconfigured() {
    let config = CloudOcrConfig {
        api_key: Some("   ".to_string()),
        ..CloudOcrConfig::default()
    };
    let cloud = CloudOcr::new(&config).expect("client builds");

    assert!(!cloud.is_configured());
    let error = cloud.recognize(b"png").expect_err("no key configured");
    assert!(matches!(error, OcrError::Unconfigured(_)));
}
