use super::*;

fn labels(registry: &SessionRegistry) -> Vec<String> {
    (0..registry.tab_count())
        .filter_map(|i| registry.tab_label(i).map(str::to_string))
        .collect()
}

#[test]
fn starts_with_only_the_welcome_tab() {
    let registry = SessionRegistry::default();
    assert_eq!(registry.tab_count(), 1);
    assert_eq!(registry.focused(), 0);
    assert_eq!(labels(&registry), ["Welcome"]);
    assert!(registry.contains("Welcome"));
}

#[test]
fn creating_a_session_appends_focuses_and_clears_input() {
    let mut registry = SessionRegistry::default();
    let mut input = SessionInput {
        value: "box1".into(),
        placeholder: "stale prompt".into(),
    };

    let index = registry
        .create_session(&mut input, SessionKind::Local)
        .expect("created");

    assert_eq!(index, 1);
    assert_eq!(registry.tab_count(), 2);
    assert_eq!(registry.focused(), 1);
    assert_eq!(input, SessionInput::default());
    assert_eq!(labels(&registry), ["Welcome", "LOCAL - box1"]);
    assert_eq!(registry.get("box1").expect("session").kind(), SessionKind::Local);
}

#[test]
fn every_fresh_name_adds_exactly_one_tab() {
    let mut registry = SessionRegistry::default();
    let names = ["a", "b", "rig 3", "Box-4", "welcome"];
    for (i, name) in names.iter().enumerate() {
        let kind = if i % 2 == 0 {
            SessionKind::Local
        } else {
            SessionKind::Network
        };
        let mut input = SessionInput::with_value(*name);
        let before = registry.tab_count();
        let index = registry.create_session(&mut input, kind).expect("created");
        assert_eq!(registry.tab_count(), before + 1);
        assert_eq!(registry.focused(), index);
        assert!(input.value.is_empty());
        assert!(input.placeholder.is_empty());
    }
    assert_eq!(
        labels(&registry),
        [
            "Welcome",
            "LOCAL - a",
            "NETWORK - b",
            "LOCAL - rig 3",
            "NETWORK - Box-4",
            "LOCAL - welcome",
        ]
    );
}

#[test]
fn empty_name_prompts_without_touching_registry_or_value() {
    let mut registry = SessionRegistry::default();
    let mut input = SessionInput::with_value("   ");

    let err = registry
        .create_session(&mut input, SessionKind::Local)
        .expect_err("empty name");

    assert_eq!(err, SessionError::EmptyName);
    assert_eq!(input.value, "   ");
    assert_eq!(input.placeholder, EMPTY_NAME_PROMPT);
    assert_eq!(registry.tab_count(), 1);
    assert_eq!(registry.focused(), 0);
}

#[test]
fn duplicate_name_clears_input_and_keeps_order() {
    let mut registry = SessionRegistry::default();
    registry
        .create_session(&mut SessionInput::with_value("A"), SessionKind::Local)
        .expect("first");
    registry
        .create_session(&mut SessionInput::with_value("B"), SessionKind::Local)
        .expect("second");
    registry.focus(1);
    let before = labels(&registry);

    let mut input = SessionInput::with_value("A");
    let err = registry
        .create_session(&mut input, SessionKind::Network)
        .expect_err("duplicate");

    assert_eq!(err, SessionError::DuplicateName("A".into()));
    assert!(input.value.is_empty());
    assert_eq!(input.placeholder, DUPLICATE_NAME_PROMPT);
    assert_eq!(labels(&registry), before);
    assert_eq!(registry.focused(), 1);
    assert_eq!(registry.get("A").expect("session").kind(), SessionKind::Local);
}

#[test]
fn same_name_across_kinds_is_rejected() {
    let mut registry = SessionRegistry::default();
    registry
        .create_session(&mut SessionInput::with_value("A"), SessionKind::Local)
        .expect("local");
    let rejected =
        registry.create_session(&mut SessionInput::with_value("A"), SessionKind::Network);

    assert!(rejected.is_err());
    assert_eq!(registry.tab_count(), 2);
    assert_eq!(labels(&registry), ["Welcome", "LOCAL - A"]);
}

#[test]
fn welcome_name_is_reserved() {
    let mut registry = SessionRegistry::default();
    let mut input = SessionInput::with_value("Welcome");
    let err = registry
        .create_session(&mut input, SessionKind::Local)
        .expect_err("reserved");
    assert!(matches!(err, SessionError::DuplicateName(_)));
    assert_eq!(registry.tab_count(), 1);
}

#[test]
fn focus_rejects_out_of_range_tabs() {
    let mut registry = SessionRegistry::default();
    registry
        .create_session(&mut SessionInput::with_value("A"), SessionKind::Local)
        .expect("created");
    assert!(registry.focus(0));
    assert_eq!(registry.focused(), 0);
    assert!(!registry.focus(2));
    assert_eq!(registry.focused(), 0);
}

#[test]
fn network_sessions_use_configured_remote() {
    let mut registry = SessionRegistry::new(SessionWiring {
        local_control_port: 7000,
        remote: RemoteEndpoint {
            host: "10.1.1.9".into(),
            port: 6229,
        },
    });
    registry
        .create_session(&mut SessionInput::with_value("rig"), SessionKind::Network)
        .expect("created");
    let session = registry.get("rig").expect("session");
    match session.view() {
        SessionView::Network(view) => assert_eq!(view.endpoint().host, "10.1.1.9"),
        SessionView::Local(_) => panic!("expected network session"),
    }
    assert_eq!(registry.focused_layout().title, "NETWORK - rig");
}

#[test]
fn summaries_mark_the_focused_tab() {
    let mut registry = SessionRegistry::default();
    registry
        .create_session(&mut SessionInput::with_value("A"), SessionKind::Local)
        .expect("created");
    let summary = registry.summaries();
    assert_eq!(summary.focused, 1);
    assert_eq!(summary.tabs.len(), 2);
    assert!(!summary.tabs[0].focused);
    assert!(summary.tabs[0].kind.is_none());
    assert!(summary.tabs[1].focused);
    assert_eq!(summary.tabs[1].kind, Some(SessionKind::Local));
    assert!(summary.tabs[1].created_at.is_some());
}
