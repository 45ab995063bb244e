//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `timeline_notes_core` linkage.
//! - Drive one deterministic hover and activation pass against the
//!   in-memory host and print the resulting events.
//!
//! Usage: `timeline_notes_cli [ABSOLUTE_LOG_DIR]`

use std::cell::RefCell;
use std::rc::Rc;
use timeline_notes_core::{
    core_version, init_logging, LoggingConfig, MarkerInput, MemoryHost, Note, NotesConfig,
    NotesEvent, NotesSession,
};

fn main() {
    println!("timeline_notes_core version={}", core_version());

    if let Some(log_dir) = std::env::args().nth(1) {
        match init_logging(&LoggingConfig::with_default_level(log_dir)) {
            Ok(()) => println!("logging=on"),
            Err(err) => eprintln!("logging=off error={err}"),
        }
    }

    if let Err(err) = run_scenario() {
        eprintln!("scenario=failed error={err}");
        std::process::exit(1);
    }
}

fn run_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let intro = Note::new(12.0, "Intro ends here");
    let chorus = Note::new(48.0, "Chorus").with_modal_content("Chorus, full annotation");
    let late = Note::new(150.0, "Past the end, never placed");

    let mut session = NotesSession::with_notes(
        MemoryHost::new(100.0),
        NotesConfig::default(),
        vec![intro.clone(), chorus.clone(), late],
    )?;

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    session.subscribe(move |event| sink.borrow_mut().push(describe(event)));

    session.on_ready();
    for (id, percent) in session.host().marker_positions() {
        println!("marker note={id} left={percent:.1}%");
    }

    session.handle_marker(intro.id, MarkerInput::PointerEnter);
    session.animation_frame();
    session.handle_marker(intro.id, MarkerInput::PointerLeave);
    let hide_delay = session.config().hide_delay_ms;
    session.advance(hide_delay);

    session.handle_marker(chorus.id, MarkerInput::Click);
    println!("modal_open={}", session.modal_note() == Some(chorus.id));
    session.handle_backdrop_click();

    let report = session.dispose();
    println!(
        "dispose overlays={} timers={} live={}",
        report.overlays_released,
        report.timers_cancelled,
        session.live_overlay_count()
    );

    for line in log.borrow().iter() {
        println!("event {line}");
    }
    Ok(())
}

fn describe(event: &NotesEvent) -> String {
    match event {
        NotesEvent::HoverStart(payload)
        | NotesEvent::HoverEnd(payload)
        | NotesEvent::Activated(payload) => {
            format!("{} note={} time={}", event.name(), payload.id, payload.time)
        }
        NotesEvent::MarkersChanged { rendered, total } => {
            format!("{} rendered={rendered} total={total}", event.name())
        }
        NotesEvent::TooltipClosed { id, reason } | NotesEvent::ModalClosed { id, reason } => {
            format!("{} note={id} reason={}", event.name(), reason.as_str())
        }
        NotesEvent::RenderFailed { id, kind, message } => {
            format!(
                "{} note={id} kind={} message={message}",
                event.name(),
                kind.as_str()
            )
        }
    }
}
