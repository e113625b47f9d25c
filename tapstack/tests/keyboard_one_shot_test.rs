pub mod common;

use tapstack::config::{BehaviorConfig, OneShotConfig};
use tapstack::keyboard::Keyboard;
use tapstack::keycode::KeyCode;
use tapstack::storage::NoStorage;
use tapstack::{Duration, a, k, osl};

use crate::common::{create_keyboard, layer_off, layer_on, press, release};

fn create_one_shot_keyboard() -> Keyboard<'static, NoStorage, 1, 3, 2> {
    let layers = [
        [[osl!(1), k!(A), k!(B)]],
        [[a!(Transparent), k!(Kc1), k!(Kc2)]],
    ];
    let behavior = BehaviorConfig {
        one_shot: OneShotConfig {
            timeout: Duration::from_millis(1000),
        },
        ..Default::default()
    };
    create_keyboard(layers, behavior)
}

#[test]
fn test_one_shot_layer() {
    let keyboard = key_sequence_test!(
        keyboard: create_one_shot_keyboard(),
        sequence: [
            [0, 0, true, 0],
            [0, 0, false, 50],
            [0, 1, true, 50],
            [0, 1, false, 50],
            [0, 1, true, 50],
            [0, 1, false, 50],
        ],
        expected_effects: [
            layer_on(1),
            layer_off(1),
            press(KeyCode::Kc1),
            release(KeyCode::Kc1),
            press(KeyCode::A),
            release(KeyCode::A),
        ]
    );
    assert_eq!(keyboard.state().one_shot_layer(), None);
}

#[test]
fn test_one_shot_timeout() {
    key_sequence_test!(
        keyboard: create_one_shot_keyboard(),
        sequence: [
            [0, 0, true, 0],
            [0, 0, false, 50],
        ],
        idle: 1500,
        expected_effects: [layer_on(1), layer_off(1)]
    );
}

#[test]
fn test_one_shot_pending() {
    let keyboard = key_sequence_test!(
        keyboard: create_one_shot_keyboard(),
        sequence: [
            [0, 0, true, 0],
            [0, 0, false, 50],
        ],
        idle: 500,
        expected_effects: [layer_on(1)]
    );
    assert_eq!(keyboard.state().one_shot_layer(), Some(1));
    assert_eq!(keyboard.next_deadline(), Some(tapstack::Instant::from_millis(1000)));
}

#[test]
fn test_one_shot_consumed_while_held() {
    key_sequence_test!(
        keyboard: create_one_shot_keyboard(),
        sequence: [
            [0, 0, true, 0],
            [0, 1, true, 50],
            [0, 1, false, 50],
            [0, 0, false, 50],
            [0, 2, true, 50],
            [0, 2, false, 50],
        ],
        expected_effects: [
            layer_on(1),
            layer_off(1),
            press(KeyCode::Kc1),
            release(KeyCode::Kc1),
            press(KeyCode::B),
            release(KeyCode::B),
        ]
    );
}
