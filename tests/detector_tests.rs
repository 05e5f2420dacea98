use learnapp::detect::expandable::{ExpansionEffect, ExpansionType, classify_effect, detect_expansion};
use learnapp::detect::state_detector::{RecommendedAction, ScreenCondition, classify_state, detect};
use learnapp::state::state_builder::build_state;
use learnapp::state::state_model::ElementInfo;
use learnapp::tree::danger::KeywordDangerPolicy;
use learnapp::tree::elements::enumerate_elements;
use learnapp::tree::node_model::{AccessibilityNode, UiSnapshot, UiWindow, WindowKind};

mod common;
use common::{app_screen, button, frame, label, row, snapshot, window};

fn input(hint: &str, top: i32) -> AccessibilityNode {
    let mut node = AccessibilityNode::new("android.widget.EditText").with_bounds(row(top));
    node.hint = Some(hint.to_string());
    node.editable = true;
    node.clickable = true;
    node
}

fn only_element(snap: &UiSnapshot) -> ElementInfo {
    let mut elements = enumerate_elements(snap, &KeywordDangerPolicy::default());
    assert_eq!(elements.len(), 1, "expected a single element");
    elements.remove(0)
}

// =========================================================================
// State detectors
// =========================================================================

#[test]
fn login_form_pauses_for_user() {
    let mut password = input("Password", 240);
    password.password = true;
    let snap = app_screen(frame(vec![input("Email", 120), password, button("Sign in", 360)]));

    let verdict = classify_state(&snap).expect("login verdict");
    assert_eq!(verdict.condition, ScreenCondition::Login);
    assert_eq!(verdict.action, RecommendedAction::PauseForUser);
    assert!(verdict.confidence >= 0.7);
    assert!(verdict.signals.iter().any(|s| s == "password_field"));
}

#[test]
fn permission_controller_window_pauses_for_user() {
    let prompt = UiWindow {
        id: 3,
        kind: WindowKind::Dialog,
        package: Some("com.google.android.permissioncontroller".into()),
        root: frame(vec![
            label("Allow Camera to access photos?", 600),
            button("While using the app", 720),
            button("Don't allow", 840),
        ]),
    };
    let snap = snapshot(
        "com.example",
        vec![window(1, WindowKind::Application, frame(vec![button("Scan", 120)])), prompt],
    );

    let verdict = classify_state(&snap).expect("permission verdict");
    assert_eq!(verdict.condition, ScreenCondition::Permission);
    assert_eq!(verdict.action, RecommendedAction::PauseForUser);
}

#[test]
fn dialog_window_is_skipped_with_negative_button_as_target() {
    let snap = snapshot(
        "com.example",
        vec![
            window(1, WindowKind::Application, frame(vec![button("Home", 120)])),
            window(
                2,
                WindowKind::Dialog,
                frame(vec![label("Rate this app", 600), button("Rate now", 720), button("Not now", 840)]),
            ),
        ],
    );

    let verdict = classify_state(&snap).expect("dialog verdict");
    assert_eq!(verdict.condition, ScreenCondition::Dialog);
    assert_eq!(verdict.action, RecommendedAction::SkipScreen);
    let target = verdict.dismiss_target.expect("dismiss target");
    assert_eq!(target.window_id, 2);
    assert_eq!(snap.find(&target).and_then(|n| n.label()), Some("Not now".into()));
}

#[test]
fn spinner_screen_waits_and_retries() {
    let snap = app_screen(frame(vec![
        AccessibilityNode::new("android.widget.ProgressBar").with_bounds(row(600)),
        label("Loading...", 720),
    ]));

    let verdict = classify_state(&snap).expect("loading verdict");
    assert_eq!(verdict.condition, ScreenCondition::Loading);
    assert_eq!(verdict.action, RecommendedAction::WaitAndRetry);
}

#[test]
fn progress_bar_alone_next_to_content_is_not_loading() {
    let snap = app_screen(frame(vec![
        AccessibilityNode::new("android.widget.ProgressBar").with_bounds(row(0)),
        button("Play", 120),
        button("Next track", 240),
    ]));

    assert_eq!(detect(ScreenCondition::Loading, &snap), None);
}

#[test]
fn error_screen_is_skipped() {
    let snap = app_screen(frame(vec![label("No internet connection", 600), button("Try again", 720)]));

    let verdict = classify_state(&snap).expect("error verdict");
    assert_eq!(verdict.condition, ScreenCondition::Error);
    assert_eq!(verdict.action, RecommendedAction::SkipScreen);
}

#[test]
fn settings_toggle_mentioning_error_is_not_an_error_screen() {
    let mut toggle = AccessibilityNode::new("android.widget.Switch")
        .with_id("com.example:id/error_reporting")
        .with_bounds(row(240));
    toggle.text = Some("Error reporting".into());
    toggle.clickable = true;
    toggle.checkable = true;
    let snap = app_screen(frame(vec![label("Privacy", 120), toggle, button("Usage data", 360)]));

    assert_eq!(detect(ScreenCondition::Error, &snap), None);
    assert!(classify_state(&snap).map(|v| v.condition) != Some(ScreenCondition::Error));
}

#[test]
fn bare_error_headline_with_retry_is_an_error_screen() {
    let snap = app_screen(frame(vec![label("Error", 600), button("Retry", 720)]));

    let verdict = detect(ScreenCondition::Error, &snap).expect("error verdict");
    assert_eq!(verdict.action, RecommendedAction::SkipScreen);
    assert!(verdict.signals.iter().any(|s| s == "retry_button"));
}

#[test]
fn empty_screen_continues() {
    let snap = app_screen(frame(vec![label("No items yet", 600)]));

    let verdict = classify_state(&snap).expect("empty verdict");
    assert_eq!(verdict.condition, ScreenCondition::Empty);
    assert_eq!(verdict.action, RecommendedAction::Continue);
}

#[test]
fn login_outranks_dialog() {
    let mut password = input("Password", 840);
    password.password = true;
    let snap = snapshot(
        "com.example",
        vec![
            window(1, WindowKind::Application, frame(vec![button("Home", 120)])),
            window(
                2,
                WindowKind::Dialog,
                frame(vec![label("Log in to continue", 600), input("Username", 720), password]),
            ),
        ],
    );

    assert!(detect(ScreenCondition::Dialog, &snap).is_some());
    assert_eq!(classify_state(&snap).map(|v| v.condition), Some(ScreenCondition::Login));
}

#[test]
fn detectors_are_independent() {
    let snap = app_screen(frame(vec![button("Settings", 120), button("Profile", 240)]));

    for condition in ScreenCondition::PRIORITY {
        assert_eq!(detect(condition, &snap), None, "{:?} fired on a plain screen", condition);
    }
}

// =========================================================================
// Expandable controls
// =========================================================================

#[test]
fn spinner_with_dropdown_id_is_confidently_expandable() {
    let spinner = AccessibilityNode::new("android.widget.Spinner")
        .with_text("Sort")
        .with_id("com.example:id/sort_dropdown")
        .with_bounds(row(120))
        .clickable();
    let element = only_element(&app_screen(frame(vec![spinner])));

    let info = detect_expansion(&element, 0.65);
    assert!(info.is_expandable);
    assert_eq!(info.expansion_type, ExpansionType::Overlay);
    assert!((info.confidence - 0.9).abs() < 1e-4, "confidence {}", info.confidence);
}

#[test]
fn overflow_icon_is_expandable() {
    let overflow = AccessibilityNode::new("android.widget.ImageView")
        .with_description("More options")
        .with_id("com.example:id/overflow_button")
        .with_bounds(row(0))
        .clickable();
    let element = only_element(&app_screen(frame(vec![overflow])));

    let info = detect_expansion(&element, 0.65);
    assert!(info.is_expandable);
    assert_eq!(info.expansion_type, ExpansionType::Overlay);
}

#[test]
fn plain_button_is_not_expandable() {
    let element = only_element(&app_screen(frame(vec![button("Settings", 120)])));

    let info = detect_expansion(&element, 0.65);
    assert!(!info.is_expandable);
    assert_eq!(info.expansion_type, ExpansionType::None);
    assert_eq!(info.confidence, 0.0);
}

#[test]
fn weak_signal_stays_below_threshold() {
    let element = only_element(&app_screen(frame(vec![button("See all", 120)])));

    let info = detect_expansion(&element, 0.65);
    assert!(!info.is_expandable);
    assert_eq!(info.expansion_type, ExpansionType::Navigation);
    assert!(info.confidence > 0.0);
}

#[test]
fn effect_new_window_is_overlay() {
    let policy = KeywordDangerPolicy::default();
    let base = frame(vec![button("Sort", 120)]);
    let before = build_state(&app_screen(base.clone()), &policy, 0);
    let after = build_state(
        &snapshot(
            "com.example",
            vec![
                window(1, WindowKind::Application, base),
                window(100, WindowKind::Overlay, frame(vec![button("Newest", 240), button("Oldest", 360)])),
            ],
        ),
        &policy,
        0,
    );

    assert_eq!(classify_effect(&before, &after), ExpansionEffect::Overlay { window_ids: vec![100] });
}

#[test]
fn effect_grown_window_is_in_place() {
    let policy = KeywordDangerPolicy::default();
    let before = build_state(&app_screen(frame(vec![button("Show more", 120), button("Save", 240)])), &policy, 0);
    let after = build_state(
        &app_screen(frame(vec![button("Show more", 120), button("Advanced", 180), button("Save", 240)])),
        &policy,
        0,
    );

    match classify_effect(&before, &after) {
        ExpansionEffect::InPlace { revealed } => {
            let names: Vec<_> = revealed.iter().map(|e| e.display_name()).collect();
            assert_eq!(names, ["Advanced"]);
        }
        other => panic!("expected in-place effect, got {:?}", other),
    }
}

#[test]
fn effect_replaced_content_is_navigation() {
    let policy = KeywordDangerPolicy::default();
    let before = build_state(&app_screen(frame(vec![button("Settings", 120)])), &policy, 0);
    let after = build_state(&app_screen(frame(vec![label("Settings", 0), button("Wi-Fi", 120)])), &policy, 0);

    assert_eq!(classify_effect(&before, &after), ExpansionEffect::Navigated);
}

#[test]
fn effect_identical_screen_is_no_change() {
    let policy = KeywordDangerPolicy::default();
    let snap = app_screen(frame(vec![button("Sort", 120)]));
    let before = build_state(&snap, &policy, 0);
    let after = build_state(&snap, &policy, 500);

    assert_eq!(classify_effect(&before, &after), ExpansionEffect::NoChange);
}
