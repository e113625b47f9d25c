pub mod common;

use embassy_time::{Duration, Instant};
use tapstack::config::{BehaviorConfig, HoldMode, TapHoldConfig};
use tapstack::effect::Effect;
use tapstack::event::{KeyEvent, KeyPos};
use tapstack::keyboard::Keyboard;
use tapstack::keycode::KeyCode;
use tapstack::modifier::ModifierCombination;
use tapstack::storage::NoStorage;
use tapstack::tap_hold::DualRoleState;
use tapstack::{EFFECT_BUFFER_SIZE, MAX_EVENT_EFFECTS, a, heapless, k, lt, mt, shifted};

use crate::common::{Recorder, create_keyboard, layer_off, layer_on, mod_clear, mod_set, press, release};

fn create_tap_hold_keyboard(mode: HoldMode) -> Keyboard<'static, NoStorage, 1, 4, 2> {
    let layers = [
        [[lt!(1, Space), mt!(A, ModifierCombination::LSHIFT), k!(B), k!(C)]],
        [[a!(Transparent), k!(Kc1), k!(Kc2), k!(Kc3)]],
    ];
    let behavior = BehaviorConfig {
        tap_hold: TapHoldConfig {
            timeout: Duration::from_millis(200),
            mode,
        },
        ..Default::default()
    };
    create_keyboard(layers, behavior)
}

#[test]
fn test_tap() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::HoldOnOtherPress),
        sequence: [
            [0, 0, true, 0],
            [0, 0, false, 100],
        ],
        expected_effects: [press(KeyCode::Space), release(KeyCode::Space)]
    );
}

#[test]
fn test_hold_by_timeout() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::HoldOnOtherPress),
        sequence: [
            [0, 0, true, 0],
            [0, 0, false, 300],
        ],
        expected_effects: [layer_on(1), layer_off(1)]
    );
}

#[test]
fn test_hold_on_other_press() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::HoldOnOtherPress),
        sequence: [
            [0, 0, true, 0],
            [0, 2, true, 50],
            [0, 2, false, 20],
            [0, 0, false, 20],
        ],
        expected_effects: [
            layer_on(1),
            // Resolved on the hold layer
            press(KeyCode::Kc2),
            release(KeyCode::Kc2),
            layer_off(1),
        ]
    );
}

#[test]
fn test_other_release_does_not_decide() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::HoldOnOtherPress),
        sequence: [
            [0, 2, true, 0],
            [0, 0, true, 10],
            [0, 2, false, 10],
            [0, 0, false, 10],
        ],
        expected_effects: [
            press(KeyCode::B),
            release(KeyCode::B),
            press(KeyCode::Space),
            release(KeyCode::Space),
        ]
    );
}

#[test]
fn test_nested_dual_role_keys() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::HoldOnOtherPress),
        sequence: [
            [0, 1, true, 0],
            [0, 0, true, 10],
            [0, 0, false, 10],
            [0, 1, false, 10],
        ],
        expected_effects: [
            mod_set(ModifierCombination::LSHIFT),
            press(KeyCode::Space),
            release(KeyCode::Space),
            mod_clear(ModifierCombination::LSHIFT),
        ]
    );
}

#[test]
fn test_hold_expires_on_tick() {
    let keyboard = key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::HoldOnOtherPress),
        sequence: [[0, 1, true, 0]],
        idle: 250,
        expected_effects: [mod_set(ModifierCombination::LSHIFT)]
    );
    assert_eq!(keyboard.state().dual_role().state(KeyPos::new(0, 1)), DualRoleState::HoldDecided);
    assert_eq!(keyboard.next_deadline(), None);
}

#[test]
fn test_next_deadline() {
    let mut keyboard = create_tap_hold_keyboard(HoldMode::HoldOnOtherPress);
    let mut recorder = Recorder::default();
    let t0 = Instant::from_millis(1000);
    keyboard.process(KeyEvent::press(0, 0, t0), &mut recorder);
    assert_eq!(keyboard.next_deadline(), Some(t0 + Duration::from_millis(200)));

    // Nothing happens before the deadline
    keyboard.tick(t0 + Duration::from_millis(199), &mut recorder);
    assert!(recorder.0.is_empty());
    keyboard.tick(t0 + Duration::from_millis(200), &mut recorder);
    assert_eq!(recorder.0, vec![layer_on(1)]);
}

#[test]
fn test_timeout_mode_tap_replays_buffered_keys() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::Timeout),
        sequence: [
            [0, 0, true, 0],
            [0, 2, true, 50],
            [0, 2, false, 20],
            [0, 0, false, 20],
        ],
        expected_effects: [
            press(KeyCode::Space),
            release(KeyCode::Space),
            press(KeyCode::B),
            release(KeyCode::B),
        ]
    );
}

#[test]
fn test_timeout_mode_hold() {
    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::Timeout),
        sequence: [
            [0, 0, true, 0],
            [0, 2, true, 50],
            [0, 2, false, 200],
            [0, 0, false, 10],
        ],
        expected_effects: [
            layer_on(1),
            press(KeyCode::Kc2),
            release(KeyCode::Kc2),
            layer_off(1),
        ]
    );
}

#[test]
fn test_timeout_mode_other_press_waits() {
    let keyboard = key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::Timeout),
        sequence: [
            [0, 0, true, 0],
            [0, 2, true, 50],
        ],
        expected_effects: []
    );
    assert_eq!(keyboard.state().buffered_events(), 1);

    key_sequence_test!(
        keyboard: create_tap_hold_keyboard(HoldMode::Timeout),
        sequence: [
            [0, 0, true, 0],
            [0, 2, true, 50],
        ],
        idle: 300,
        expected_effects: [layer_on(1), press(KeyCode::Kc2)]
    );
}

fn create_shifted_row_keyboard() -> Keyboard<'static, NoStorage, 1, 9, 1> {
    let layers = [[[
        mt!(Space, ModifierCombination::LCTRL),
        shifted!(A),
        shifted!(A),
        shifted!(A),
        shifted!(A),
        shifted!(A),
        shifted!(A),
        shifted!(A),
        shifted!(A),
    ]]];
    let behavior = BehaviorConfig {
        tap_hold: TapHoldConfig {
            timeout: Duration::from_millis(200),
            mode: HoldMode::Timeout,
        },
        ..Default::default()
    };
    create_keyboard(layers, behavior)
}

/// Hold the dual-role key and tap every shifted key while it is undecided
fn fill_held_buffer(keyboard: &mut Keyboard<'static, NoStorage, 1, 9, 1>) {
    let mut recorder = Recorder::default();
    keyboard.process(KeyEvent::press(0, 0, Instant::from_millis(0)), &mut recorder);
    for col in 1..9u8 {
        let t = 10 * col as u64;
        keyboard.process(KeyEvent::press(0, col, Instant::from_millis(t)), &mut recorder);
        keyboard.process(KeyEvent::release(0, col, Instant::from_millis(t + 5)), &mut recorder);
    }
    assert!(recorder.0.is_empty());
    assert_eq!(keyboard.state().buffered_events(), 16);
}

fn shifted_taps(count: usize) -> Vec<Effect> {
    let mut effects = Vec::new();
    for _ in 0..count {
        effects.push(mod_set(ModifierCombination::LSHIFT));
        effects.push(press(KeyCode::A));
        effects.push(release(KeyCode::A));
        effects.push(mod_clear(ModifierCombination::LSHIFT));
    }
    effects
}

#[test]
fn test_timeout_replays_full_buffer_in_one_tick() {
    let mut keyboard = create_shifted_row_keyboard();
    fill_held_buffer(&mut keyboard);

    let mut effects: heapless::Vec<Effect, EFFECT_BUFFER_SIZE> = heapless::Vec::new();
    keyboard.tick(Instant::from_millis(300), &mut effects);

    let mut expected = vec![mod_set(ModifierCombination::LCTRL)];
    expected.extend(shifted_taps(8));
    assert_eq!(effects.len(), 33);
    assert_eq!(effects.last(), Some(&mod_clear(ModifierCombination::LSHIFT)));
    assert_eq!(effects.as_slice(), expected.as_slice());
    assert_eq!(keyboard.state().buffered_events(), 0);
    assert_eq!(keyboard.next_deadline(), None);
}

#[test]
fn test_replay_resumes_when_sink_is_full() {
    let mut keyboard = create_shifted_row_keyboard();
    fill_held_buffer(&mut keyboard);

    let now = Instant::from_millis(300);
    let mut received = Vec::new();
    let mut effects: heapless::Vec<Effect, MAX_EVENT_EFFECTS> = heapless::Vec::new();
    keyboard.tick(now, &mut effects);
    received.extend(effects);
    // The sink is too small for the buffered events, they wait for the next tick
    assert_eq!(received, vec![mod_set(ModifierCombination::LCTRL)]);
    assert_eq!(keyboard.next_deadline(), Some(Instant::from_millis(10)));

    // A new event goes after the waiting ones
    let mut effects: heapless::Vec<Effect, MAX_EVENT_EFFECTS> = heapless::Vec::new();
    keyboard.process(KeyEvent::press(0, 1, Instant::from_millis(310)), &mut effects);
    received.extend(effects);

    let now = Instant::from_millis(310);
    let mut rounds = 0;
    while keyboard.next_deadline().is_some_and(|d| d <= now) {
        assert!(rounds < 64, "replay makes no progress");
        rounds += 1;
        let mut effects: heapless::Vec<Effect, MAX_EVENT_EFFECTS> = heapless::Vec::new();
        keyboard.tick(now, &mut effects);
        received.extend(effects);
    }

    let mut expected = vec![mod_set(ModifierCombination::LCTRL)];
    expected.extend(shifted_taps(8));
    expected.push(mod_set(ModifierCombination::LSHIFT));
    expected.push(press(KeyCode::A));
    assert_eq!(received, expected);
    assert_eq!(keyboard.state().buffered_events(), 0);
    assert_eq!(keyboard.next_deadline(), None);
}
