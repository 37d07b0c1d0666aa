use futures::future;

use std::sync::Mutex;
use std::time::Instant;

use crate::client::{Context, Error, Transport, TransportFuture};
use crate::form::Values;

/// Transport answering every call with a canned body and remembering what it
/// was asked to send.
pub(crate) struct StubTransport {
    body: Result<String, u16>,
    requests: Mutex<Vec<(String, Values)>>,
    deadlines: Mutex<Vec<Option<Instant>>>,
}

impl StubTransport {
    pub(crate) fn replying(body: &str) -> Self {
        StubTransport {
            body: Ok(body.to_string()),
            requests: Mutex::new(Vec::new()),
            deadlines: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(status: u16) -> Self {
        StubTransport {
            body: Err(status),
            requests: Mutex::new(Vec::new()),
            deadlines: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<(String, Values)> {
        self.requests.lock().unwrap().clone()
    }

    /// Deadline of the context each call was made with.
    pub(crate) fn deadlines(&self) -> Vec<Option<Instant>> {
        self.deadlines.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<(String, Values)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Transport for StubTransport {
    fn post(&self, ctx: &Context, method: &str, form: &Values) -> TransportFuture {
        self.deadlines.lock().unwrap().push(ctx.deadline());
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), form.clone()));

        match &self.body {
            Ok(body) => Box::new(future::ok(body.clone().into_bytes())),
            Err(status) => Box::new(future::err(Error::Status {
                status: *status,
                body: String::new(),
            })),
        }
    }
}
