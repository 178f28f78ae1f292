use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{Value, json};

use crate::contact::form::ContactForm;
use crate::contact::relay::{MailRelay, Mailer, RelayRequest};
use crate::foundation::core::Millis;
use crate::foundation::error::{FolioError, FolioResult};
use crate::runtime::scheduler::Scheduler;

pub const DEFAULT_ENDPOINT: &str = "/sendMail.php";

/// Outgoing contact submission.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ContactRequest {
    pub method: String,
    pub endpoint: String,
    pub content_type: String,
    pub body: String,
}

impl ContactRequest {
    /// `POST` of `form` as JSON.
    pub fn post_json(endpoint: &str, form: &ContactForm) -> FolioResult<Self> {
        Ok(Self {
            method: "POST".to_owned(),
            endpoint: endpoint.to_owned(),
            content_type: "application/json".to_owned(),
            body: serde_json::to_string(form)?,
        })
    }
}

/// Receives the decoded JSON body on success. Called exactly once.
pub type SendCallback = Box<dyn FnOnce(FolioResult<Value>)>;

/// Delivery of a [`ContactRequest`]. Implementations may call `done` synchronously or later.
pub trait ContactTransport {
    fn send(&self, request: ContactRequest, done: SendCallback);
}

/// Acknowledges every request after a fixed latency without leaving the process.
#[derive(Clone, Debug)]
pub struct SimulatedTransport {
    scheduler: Scheduler,
    latency: Millis,
    failing: Rc<Cell<bool>>,
    sent: Rc<RefCell<Vec<ContactRequest>>>,
}

impl SimulatedTransport {
    pub fn new(scheduler: Scheduler, latency: Millis) -> Self {
        Self {
            scheduler,
            latency,
            failing: Rc::new(Cell::new(false)),
            sent: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Answer with a network error while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn sent(&self) -> Vec<ContactRequest> {
        self.sent.borrow().clone()
    }
}

impl ContactTransport for SimulatedTransport {
    fn send(&self, request: ContactRequest, done: SendCallback) {
        tracing::info!(endpoint = %request.endpoint, "simulated contact submission");
        self.sent.borrow_mut().push(request);
        let failing = self.failing.get();
        self.scheduler.set_timeout(self.latency, move || {
            if failing {
                done(Err(FolioError::transport("simulated network failure")));
            } else {
                done(Ok(json!({ "success": true, "simulated": true })));
            }
        });
    }
}

/// Loops requests through an in-process [`MailRelay`].
pub struct RelayTransport<M> {
    relay: Rc<MailRelay<M>>,
    scheduler: Scheduler,
    latency: Millis,
}

impl<M> std::fmt::Debug for RelayTransport<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayTransport")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl<M: Mailer + 'static> RelayTransport<M> {
    pub fn new(relay: Rc<MailRelay<M>>, scheduler: Scheduler, latency: Millis) -> Self {
        Self {
            relay,
            scheduler,
            latency,
        }
    }

    pub fn relay(&self) -> &MailRelay<M> {
        &self.relay
    }
}

impl<M: Mailer + 'static> ContactTransport for RelayTransport<M> {
    fn send(&self, request: ContactRequest, done: SendCallback) {
        let relay = Rc::clone(&self.relay);
        self.scheduler.set_timeout(self.latency, move || {
            let response = relay.handle(&RelayRequest::new(request.method, request.body));
            done(response.into_result());
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/contact/transport.rs"]
mod tests;
