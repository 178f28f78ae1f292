use super::*;
use crate::contact::relay::{MemoryMailer, RelaySettings};

fn form() -> ContactForm {
    ContactForm::new("Ada", "ada@example.org", "Hello there, let's talk.")
}

fn capture() -> (Rc<RefCell<Option<FolioResult<Value>>>>, SendCallback) {
    let slot = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&slot);
    (slot, Box::new(move |r| *sink.borrow_mut() = Some(r)))
}

#[test]
fn post_json_uses_relay_field_names() {
    let req = ContactRequest::post_json(DEFAULT_ENDPOINT, &form()).unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.endpoint, "/sendMail.php");
    assert_eq!(req.content_type, "application/json");
    let body: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["agreedToTerms"], json!(true));
    assert_eq!(body["website"], json!(""));
}

#[test]
fn simulated_transport_answers_after_latency() {
    let scheduler = Scheduler::new();
    let transport = SimulatedTransport::new(scheduler.clone(), Millis(1000));
    let (slot, done) = capture();
    transport.send(ContactRequest::post_json("/x", &form()).unwrap(), done);

    scheduler.advance(Millis(999));
    assert!(slot.borrow().is_none());
    scheduler.advance(Millis(1));
    assert!(matches!(&*slot.borrow(), Some(Ok(v)) if v["success"] == json!(true)));
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn simulated_transport_can_fail() {
    let scheduler = Scheduler::new();
    let transport = SimulatedTransport::new(scheduler.clone(), Millis(10));
    transport.set_failing(true);
    let (slot, done) = capture();
    transport.send(ContactRequest::post_json("/x", &form()).unwrap(), done);
    scheduler.run_until_idle();
    assert!(matches!(&*slot.borrow(), Some(Err(FolioError::Transport(_)))));
}

#[test]
fn relay_transport_maps_status_codes() {
    let scheduler = Scheduler::new();
    let relay = Rc::new(MailRelay::new(RelaySettings::default(), MemoryMailer::new()));
    let transport = RelayTransport::new(Rc::clone(&relay), scheduler.clone(), Millis(5));

    let (ok, done) = capture();
    transport.send(ContactRequest::post_json("/x", &form()).unwrap(), done);
    let (rejected, done) = capture();
    let spam = form().with_honeypot("bot");
    transport.send(ContactRequest::post_json("/x", &spam).unwrap(), done);
    scheduler.run_until_idle();

    assert!(matches!(&*ok.borrow(), Some(Ok(_))));
    let rejected = rejected.borrow();
    let Some(Err(err)) = &*rejected else {
        panic!("expected an error");
    };
    assert!(err.to_string().contains("400"));
    assert_eq!(transport.relay().mailer().sent().len(), 1);
}
