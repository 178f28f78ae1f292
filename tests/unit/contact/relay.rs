use super::*;

fn relay() -> MailRelay<MemoryMailer> {
    MailRelay::new(RelaySettings::default(), MemoryMailer::new())
}

fn post(body: &str) -> RelayRequest {
    RelayRequest::new("POST", body)
}

fn error_of(response: &RelayResponse) -> String {
    let body: Value = serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
    body["error"].as_str().unwrap().to_owned()
}

const VALID: &str = r#"{"name":" Ada ","email":"ada@example.org","message":"Hi <b>there</b>\nline two","agreedToTerms":true,"website":""}"#;

#[test]
fn options_short_circuits_with_cors_headers() {
    let response = relay().handle(&RelayRequest::new("OPTIONS", ""));
    assert_eq!(response.status, 200);
    assert_eq!(response.body, None);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    assert_eq!(response.header("Access-Control-Allow-Methods"), Some("POST, OPTIONS"));
    assert_eq!(response.header("Access-Control-Allow-Headers"), Some("Content-Type"));
}

#[test]
fn other_methods_are_not_allowed() {
    let response = relay().handle(&RelayRequest::new("GET", ""));
    assert_eq!(response.status, 405);
    assert_eq!(response.header("Allow"), Some("POST"));
    assert_eq!(response.header("Content-Type"), Some("application/json; charset=UTF-8"));
    assert!(!error_of(&response).is_empty());
}

#[test]
fn valid_post_sends_escaped_mail() {
    let relay = relay();
    let response = relay.handle(&post(VALID));
    assert_eq!(response.status, 200);
    assert_eq!(response.clone().into_result().unwrap(), json!({ "success": true }));

    let sent = relay.mailer().sent();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.to, "contact@example.com");
    assert_eq!(mail.from, "noreply@example.com");
    assert_eq!(mail.reply_to, "ada@example.org");
    assert_eq!(mail.subject, "New contact request from Ada");
    assert!(mail.html_body.contains("Ada &lt;ada@example.org&gt;"));
    assert!(mail.html_body.contains("Hi there<br />\nline two"));
    assert!(!mail.html_body.contains("<b>"));
}

#[test]
fn user_text_is_escaped() {
    let relay = relay();
    let body = json!({
        "name": "<script>x</script> & Co",
        "email": "a@b.de",
        "message": "5 > 3 \"quoted\" 'single'",
        "agreedToTerms": true,
    });
    assert_eq!(relay.handle(&post(&body.to_string())).status, 200);
    let mail = &relay.mailer().sent()[0];
    assert!(mail.subject.contains("&lt;script&gt;x&lt;/script&gt; &amp; Co"));
    assert!(mail.html_body.contains("5 &gt; 3 &quot;quoted&quot; &#039;single&#039;"));
}

#[test]
fn line_breaks_in_name_stay_inside_the_subject() {
    let relay = relay();
    let body = json!({
        "name": "Bob\r\nBcc: victim@example.org",
        "email": "bob@example.org",
        "message": "hello",
        "agreedToTerms": true,
    });
    assert_eq!(relay.handle(&post(&body.to_string())).status, 200);
    let mail = &relay.mailer().sent()[0];
    assert_eq!(mail.subject, "New contact request from Bob  Bcc: victim@example.org");
    let headers = mail.header_block();
    assert!(!headers.lines().any(|l| l.starts_with("Bcc:")));
    assert_eq!(headers.split("\r\n").count(), 6);
}

#[test]
fn empty_and_malformed_bodies_are_rejected() {
    let relay = relay();
    assert_eq!(relay.handle(&post("")).status, 400);
    let bad = relay.handle(&post("{not json"));
    assert_eq!(bad.status, 400);
    assert!(error_of(&bad).starts_with("invalid JSON"));
    assert!(relay.mailer().sent().is_empty());
}

#[test]
fn honeypot_is_rejected() {
    let relay = relay();
    let mut body: Value = serde_json::from_str(VALID).unwrap();
    body["website"] = json!("http://bots.example");
    let response = relay.handle(&post(&body.to_string()));
    assert_eq!(response.status, 400);
    assert!(error_of(&response).contains("honeypot"));
    assert!(relay.mailer().sent().is_empty());

    body["website"] = json!("0");
    assert_eq!(relay.handle(&post(&body.to_string())).status, 200);
}

#[test]
fn invalid_fields_are_rejected() {
    let relay = relay();
    let base: Value = serde_json::from_str(VALID).unwrap();
    let cases = [
        ("email", json!("not-an-address")),
        ("email", json!(42)),
        ("name", json!("   ")),
        ("message", json!("")),
        ("agreedToTerms", json!("true")),
        ("agreedToTerms", json!(false)),
    ];
    for (key, value) in cases {
        let mut body = base.clone();
        body[key] = value.clone();
        let response = relay.handle(&post(&body.to_string()));
        assert_eq!(response.status, 400, "{key} = {value}");
    }
    let mut missing = base.clone();
    missing.as_object_mut().unwrap().remove("agreedToTerms");
    assert_eq!(relay.handle(&post(&missing.to_string())).status, 400);
    assert!(relay.mailer().sent().is_empty());
}

#[test]
fn mailer_failure_is_a_server_error() {
    let relay = relay();
    relay.mailer().set_failing(true);
    let response = relay.handle(&post(VALID));
    assert_eq!(response.status, 500);
    let err = response.into_result().unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[test]
fn outbox_mailer_writes_files() {
    let dir = std::env::temp_dir().join(format!("folio-outbox-{}", std::process::id()));
    let relay = MailRelay::new(RelaySettings::default(), OutboxMailer::new(&dir));
    assert_eq!(relay.handle(&post(VALID)).status, 200);
    let written = std::fs::read_to_string(dir.join("mail-0001.html")).unwrap();
    assert!(written.starts_with("MIME-Version: 1.0"));
    assert!(written.contains("Reply-To: ada@example.org"));
    let _ = std::fs::remove_dir_all(&dir);
}
