use std::cell::RefCell;
use std::rc::Rc;
use timeline_notes_core::{
    CloseReason, ContentSource, ElementId, ElementRole, Host, KeyInput, MarkerInput, MemoryHost,
    ModalOptions, Note, NoteId, NotesConfig, NotesEvent, NotesSession, OverlayError, OverlayKind,
    RenderError, ViewAdapter,
};
use uuid::Uuid;

struct BrokenView;

impl ViewAdapter for BrokenView {
    fn mount(&self, _container: ElementId) -> Result<(), RenderError> {
        Err(RenderError::mount("no renderer"))
    }

    fn unmount(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

fn ready_session(config: NotesConfig, notes: Vec<Note>) -> NotesSession<MemoryHost> {
    let mut host = MemoryHost::new(100.0);
    host.play();
    let mut session = NotesSession::with_notes(host, config, notes).unwrap();
    session.on_ready();
    session
}

fn record(session: &mut NotesSession<MemoryHost>) -> Rc<RefCell<Vec<NotesEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}

fn modal_text(session: &NotesSession<MemoryHost>) -> String {
    let modals = session.host().elements_with_role(ElementRole::Modal);
    assert_eq!(modals.len(), 1, "exactly one modal expected");
    session.host().element(modals[0]).unwrap().text.clone()
}

fn modal_closes(log: &RefCell<Vec<NotesEvent>>) -> Vec<(NoteId, CloseReason)> {
    log.borrow()
        .iter()
        .filter_map(|event| match event {
            NotesEvent::ModalClosed { id, reason } => Some((*id, *reason)),
            _ => None,
        })
        .collect()
}

#[test]
fn click_opens_modal_and_pauses_playback() {
    let note = Note::new(40.0, "short").with_modal_content("long form");
    let mut session = ready_session(NotesConfig::default(), vec![note.clone()]);
    let log = record(&mut session);

    session.handle_marker(note.id, MarkerInput::Click);

    assert_eq!(session.modal_note(), Some(note.id));
    assert_eq!(modal_text(&session), "long form");
    assert_eq!(
        session
            .host()
            .elements_with_role(ElementRole::ModalBackdrop)
            .len(),
        1
    );
    assert!(session.host().is_paused());
    assert_eq!(session.host().pause_calls(), 1);
    assert!(matches!(&log.borrow()[0], NotesEvent::Activated(payload) if payload.id == note.id));
}

#[test]
fn pause_policy_can_be_disabled() {
    let note = Note::new(40.0, "short");
    let config = NotesConfig {
        pause_on_modal: false,
        ..NotesConfig::default()
    };
    let mut session = ready_session(config, vec![note.clone()]);

    session.handle_marker(note.id, MarkerInput::Click);

    assert_eq!(modal_text(&session), "short");
    assert!(!session.host().is_paused());
    assert_eq!(session.host().pause_calls(), 0);
}

#[test]
fn activation_closes_another_markers_tooltip() {
    let first = Note::new(20.0, "first");
    let second = Note::new(70.0, "second");
    let mut session = ready_session(NotesConfig::default(), vec![first.clone(), second.clone()]);
    let log = record(&mut session);

    session.handle_marker(second.id, MarkerInput::PointerEnter);
    session.handle_marker(first.id, MarkerInput::Click);

    assert_eq!(session.tooltip_note(), None);
    assert_eq!(session.modal_note(), Some(first.id));
    assert!(session
        .host()
        .elements_with_role(ElementRole::Tooltip)
        .is_empty());
    assert!(log.borrow().iter().any(|event| matches!(
        event,
        NotesEvent::TooltipClosed { id, reason: CloseReason::Activation } if *id == second.id
    )));
}

#[test]
fn enter_and_space_activate_other_keys_do_not() {
    let note = Note::new(40.0, "short");
    let mut session = ready_session(NotesConfig::default(), vec![note.clone()]);

    session.handle_marker(note.id, MarkerInput::Key(KeyInput::Other));
    assert_eq!(session.modal_note(), None);

    session.handle_marker(note.id, MarkerInput::Key(KeyInput::Enter));
    assert_eq!(session.modal_note(), Some(note.id));
    assert!(session.close_modal());

    session.handle_marker(note.id, MarkerInput::Key(KeyInput::Space));
    assert_eq!(session.modal_note(), Some(note.id));
}

#[test]
fn backdrop_click_closes_then_notifies() {
    let note = Note::new(40.0, "short");
    let mut session = ready_session(NotesConfig::default(), vec![note.clone()]);
    let order = Rc::new(RefCell::new(Vec::new()));

    let callback_order = Rc::clone(&order);
    session
        .open_modal(
            note.id,
            ModalOptions::on_backdrop_click(move |id| {
                callback_order.borrow_mut().push(format!("callback:{id}"));
            }),
        )
        .unwrap();
    let event_order = Rc::clone(&order);
    session.subscribe(move |event| {
        if let NotesEvent::ModalClosed { reason, .. } = event {
            event_order
                .borrow_mut()
                .push(format!("closed:{}", reason.as_str()));
        }
    });

    assert!(session.handle_backdrop_click());

    assert_eq!(session.modal_note(), None);
    assert!(session
        .host()
        .elements_with_role(ElementRole::ModalBackdrop)
        .is_empty());
    assert!(session
        .host()
        .elements_with_role(ElementRole::Modal)
        .is_empty());
    assert_eq!(
        *order.borrow(),
        vec![format!("callback:{}", note.id), "closed:backdrop".to_string()]
    );
    assert!(!session.handle_backdrop_click());
}

#[test]
fn second_modal_replaces_the_first() {
    let first = Note::new(20.0, "first");
    let second = Note::new(70.0, "second");
    let mut session = ready_session(NotesConfig::default(), vec![first.clone(), second.clone()]);
    let log = record(&mut session);

    session.handle_marker(first.id, MarkerInput::Click);
    session.handle_marker(second.id, MarkerInput::Click);

    assert_eq!(session.modal_note(), Some(second.id));
    assert_eq!(modal_text(&session), "second");
    assert_eq!(session.live_overlay_count(), 1);
    assert_eq!(
        modal_closes(&log),
        vec![(first.id, CloseReason::Superseded)]
    );

    assert!(session.close_modal());
    assert!(!session.close_modal());
    assert_eq!(
        modal_closes(&log),
        vec![
            (first.id, CloseReason::Superseded),
            (second.id, CloseReason::Requested)
        ]
    );
}

#[test]
fn failed_modal_render_leaves_no_backdrop() {
    let note = Note::new(40.0, "short").with_modal_content(ContentSource::view(BrokenView));
    let mut session = ready_session(NotesConfig::default(), vec![note.clone()]);
    let log = record(&mut session);

    let err = session
        .open_modal(note.id, ModalOptions::default())
        .unwrap_err();

    assert!(matches!(
        err,
        OverlayError::Render {
            kind: OverlayKind::Modal,
            ..
        }
    ));
    assert_eq!(session.modal_note(), None);
    assert_eq!(session.live_overlay_count(), 0);
    assert!(session
        .host()
        .elements_with_role(ElementRole::ModalBackdrop)
        .is_empty());
    assert!(!session.host().is_paused());
    assert!(log.borrow().iter().any(|event| matches!(
        event,
        NotesEvent::RenderFailed { kind: OverlayKind::Modal, .. }
    )));
}

#[test]
fn unknown_note_cannot_open_a_modal() {
    let mut session = ready_session(NotesConfig::default(), vec![Note::new(40.0, "short")]);
    let missing = Uuid::new_v4();

    assert_eq!(
        session
            .open_modal(missing, ModalOptions::default())
            .unwrap_err(),
        OverlayError::UnknownNote(missing)
    );
}
