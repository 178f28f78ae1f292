use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use folio::{
    Capabilities, ContactForm, ContactSubmission, ContactTransport, Element as _, ElementRef,
    FolioConfig, HeaderAutoHide, HostEvents, IntroSequence, IntroSlot, Language, LanguageState,
    MailRelay, Mailer, MemoryElement, MemoryMailer, Millis, OutboxMailer, OverlapDecision,
    OverlapPolicy, OverlapWatcher, Rect, RelayRequest, RelayResponse, RelayTransport, Scheduler,
    ScrollDriver, ScrollLock, ScrollTargets, SimulatedTransport, SubmitOutcome, TypedAnimator,
    Viewport,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "folio", version)]
struct Cli {
    /// Configuration JSON. Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the intro sequence on in-memory elements and print its events.
    Intro(IntroArgs),
    /// Decide the text colour for a text box over a shape.
    Overlap(OverlapArgs),
    /// Print scroll effect frames over a range of positions.
    Scroll(ScrollArgs),
    /// Answer one request with the mail relay.
    Relay(RelayArgs),
    /// Run a contact submission through the state machine.
    Submit(SubmitArgs),
}

#[derive(Parser, Debug)]
struct IntroArgs {
    /// Initial language.
    #[arg(long, value_parser = parse_language, default_value = "de")]
    lang: Language,

    /// Switch to this language while the intro is playing.
    #[arg(long, value_parser = parse_language)]
    switch_to: Option<Language>,

    /// Virtual time of the switch, in milliseconds.
    #[arg(long, default_value_t = 300)]
    switch_at: u64,
}

#[derive(Parser, Debug)]
struct OverlapArgs {
    /// Text box as `x,y,width,height`.
    #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
    text: Rect,

    /// Shape box as `x,y,width,height`.
    #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
    shape: Rect,

    /// Overrides the configured policy.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Viewport width.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Simulate a host without element resize observation.
    #[arg(long)]
    no_resize_observer: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Coarse,
    Strict,
}

impl From<PolicyChoice> for OverlapPolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Coarse => OverlapPolicy::Coarse,
            PolicyChoice::Strict => OverlapPolicy::Strict,
        }
    }
}

#[derive(Parser, Debug)]
struct ScrollArgs {
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    #[arg(long, default_value_t = 1200.0)]
    to: f64,

    #[arg(long, default_value_t = 100.0)]
    step: f64,

    /// Document offset of the animated section.
    #[arg(long, default_value_t = 600.0)]
    section_top: f64,
}

#[derive(Parser, Debug)]
struct RelayArgs {
    #[arg(long, default_value = "POST")]
    method: String,

    /// Request body.
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the request body from a file.
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Write accepted mail into this directory instead of keeping it in memory.
    #[arg(long)]
    outbox: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SubmitArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    message: String,

    /// Honeypot field; anything non-empty marks the submission as spam.
    #[arg(long)]
    website: Option<String>,

    /// Submit without agreeing to the privacy terms.
    #[arg(long)]
    no_terms: bool,

    /// Make the transport fail.
    #[arg(long)]
    fail: bool,

    /// Deliver through the in-process mail relay instead of the simulated transport.
    #[arg(long)]
    via_relay: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = read_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Intro(args) => cmd_intro(&config, args),
        Command::Overlap(args) => cmd_overlap(&config, args),
        Command::Scroll(args) => cmd_scroll(&config, args),
        Command::Relay(args) => cmd_relay(&config, args),
        Command::Submit(args) => cmd_submit(&config, args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_config(path: Option<&Path>) -> anyhow::Result<FolioConfig> {
    match path {
        Some(path) => FolioConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display())),
        None => Ok(FolioConfig::default()),
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| format!("unsupported language '{s}' (expected de or en)"))
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in '{s}': {e}"))?;
    let [x, y, w, h] = parts[..] else {
        return Err(format!("expected x,y,width,height, got '{s}'"));
    };
    Ok(Rect::new(x, y, x + w, y + h))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value).context("encode output")?);
    Ok(())
}

fn cmd_intro(config: &FolioConfig, args: IntroArgs) -> anyhow::Result<()> {
    let scheduler = Scheduler::new();
    let animator = TypedAnimator::new(scheduler.clone(), config.typing.timing);
    animator.subscribe(|event| {
        if let Err(err) = print_json(event) {
            tracing::warn!(error = %err, "event output failed");
        }
    });

    let language = LanguageState::new(args.lang);
    let mut elements: Vec<ElementRef> = Vec::new();
    let slots: Vec<IntroSlot> = config
        .intro
        .slots
        .iter()
        .map(|slot| {
            let element: ElementRef = MemoryElement::new(&slot.target_id, Rect::ZERO);
            elements.push(Rc::clone(&element));
            IntroSlot::new(&slot.target_id, &slot.key, element)
                .with_options(config.typing.options.clone())
        })
        .collect();
    let intro = IntroSequence::mount(
        animator,
        language.clone(),
        config.intro.translations.clone(),
        slots,
        config.intro.restart_delay,
    );

    if let Some(lang) = args.switch_to {
        scheduler.advance_to(Millis(args.switch_at));
        language.switch(lang);
    }
    scheduler.run_until_idle();

    for element in &elements {
        print_json(&json!({ "target_id": element.id(), "text": element.text() }))?;
    }
    print_json(&json!({ "restarts": intro.restarts(), "finished_at": scheduler.now() }))?;
    intro.teardown();
    Ok(())
}

fn cmd_overlap(config: &FolioConfig, args: OverlapArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.width.is_finite() && args.width > 0.0,
        "--width must be a positive number"
    );
    let events = HostEvents::new(
        Viewport {
            width: args.width,
            height: 800.0,
            scroll_y: 0.0,
        },
        Capabilities {
            resize_observer: !args.no_resize_observer,
            touch: false,
        },
    );
    let mut options = config.overlap.clone();
    if let Some(policy) = args.policy {
        options.policy = policy.into();
    }

    let text = MemoryElement::new("text", args.text);
    let shape: ElementRef = MemoryElement::new("shape", args.shape);
    let watcher = OverlapWatcher::new(events);
    let token = watcher.watch(vec![text.clone() as ElementRef], shape, options.clone());

    let decision = OverlapDecision::evaluate(args.text, args.shape, options.policy);
    print_json(&json!({
        "decision": decision,
        "policy": options.policy,
        "applied_color": text.style("color"),
    }))?;
    watcher.unwatch(token);
    Ok(())
}

fn cmd_scroll(config: &FolioConfig, args: ScrollArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.step.is_finite() && args.step > 0.0,
        "--step must be a positive number"
    );
    anyhow::ensure!(
        args.from.is_finite() && args.to.is_finite() && args.from <= args.to,
        "--from must not exceed --to"
    );

    let events = HostEvents::default();
    let parallax = MemoryElement::new("parallax", Rect::ZERO);
    let section = MemoryElement::new("section", Rect::ZERO);
    let targets = ScrollTargets {
        parallax: Some(parallax.clone() as ElementRef),
        section: Some(section.clone() as ElementRef),
        ..ScrollTargets::default()
    };
    let driver = ScrollDriver::attach(&events, config.scroll, args.section_top, targets);
    let header = HeaderAutoHide::attach(&events, config.header);

    let mut y = args.from;
    while y <= args.to {
        events.scroll_to(y);
        print_json(&json!({
            "frame": driver.last_frame(),
            "transform": parallax.style("transform"),
            "progress_style": section.style(folio::scroll::driver::PROGRESS_STYLE),
            "header_hidden": header.is_hidden(),
        }))?;
        y += args.step;
    }
    driver.detach();
    header.detach();
    Ok(())
}

fn cmd_relay(config: &FolioConfig, args: RelayArgs) -> anyhow::Result<()> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("read request body '{}'", path.display()))?,
        (None, None) => String::new(),
    };
    let request = RelayRequest::new(args.method, body);

    let response = match args.outbox {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create outbox dir '{}'", dir.display()))?;
            relay_once(config, OutboxMailer::new(dir), &request)
        }
        None => relay_once(config, MemoryMailer::new(), &request),
    };
    print_json(&response)
}

fn relay_once<M: Mailer>(config: &FolioConfig, mailer: M, request: &RelayRequest) -> RelayResponse {
    let relay = MailRelay::new(config.relay.clone(), mailer);
    relay.handle(request)
}

fn cmd_submit(config: &FolioConfig, args: SubmitArgs) -> anyhow::Result<()> {
    let scheduler = Scheduler::new();
    let lock = ScrollLock::new(HostEvents::default());
    let latency = config.contact.simulated_latency;

    let transport: Rc<dyn ContactTransport> = if args.via_relay {
        let relay = Rc::new(MailRelay::new(config.relay.clone(), MemoryMailer::new()));
        relay.mailer().set_failing(args.fail);
        Rc::new(RelayTransport::new(relay, scheduler.clone(), latency))
    } else {
        let transport = SimulatedTransport::new(scheduler.clone(), latency);
        transport.set_failing(args.fail);
        Rc::new(transport)
    };
    let machine = ContactSubmission::with_endpoint(
        scheduler.clone(),
        transport,
        lock.clone(),
        config.contact.timing,
        config.contact.endpoint.clone(),
    );

    let clock = scheduler.clone();
    let status_lock = lock.clone();
    machine.subscribe(move |status| {
        let line = json!({ "at": clock.now(), "status": status, "scroll_locked": status_lock.is_locked() });
        if let Err(err) = print_json(&line) {
            tracing::warn!(error = %err, "status output failed");
        }
    });

    let mut form = ContactForm::new(args.name, args.email, args.message).with_terms(!args.no_terms);
    if let Some(website) = args.website {
        form = form.with_honeypot(website);
    }

    let outcome = match machine.submit(form) {
        SubmitOutcome::Invalid(errors) => {
            print_json(&json!({ "outcome": "invalid", "errors": errors.to_string() }))?;
            return Ok(());
        }
        SubmitOutcome::Ignored => "ignored",
        SubmitOutcome::Spam => "spam",
        SubmitOutcome::Sent => "sent",
    };
    print_json(&json!({ "outcome": outcome }))?;
    scheduler.run_until_idle();
    anyhow::ensure!(!lock.is_locked(), "scroll lock still held after the submission settled");
    Ok(())
}
