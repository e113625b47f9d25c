pub mod common;

use tapstack::config::BehaviorConfig;
use tapstack::keyboard::Keyboard;
use tapstack::keycode::KeyCode;
use tapstack::layer_stack::LayerMode;
use tapstack::storage::NoStorage;
use tapstack::tri_layer::TriLayer;
use tapstack::{a, k, mo, tg};

use crate::common::{create_keyboard, layer_off, layer_on, press, release};

fn create_tri_layer_keyboard() -> Keyboard<'static, NoStorage, 1, 4, 4> {
    let layers = [
        [[mo!(1), mo!(2), k!(A), tg!(1)]],
        [[a!(Transparent), a!(Transparent), k!(B), a!(Transparent)]],
        [[a!(Transparent), a!(Transparent), k!(C), a!(Transparent)]],
        [[a!(Transparent), a!(Transparent), k!(D), a!(Transparent)]],
    ];
    let behavior = BehaviorConfig {
        tri_layer: Some(TriLayer::new(1, 2, 3)),
        ..Default::default()
    };
    create_keyboard(layers, behavior)
}

#[test]
fn test_tri_layer() {
    key_sequence_test!(
        keyboard: create_tri_layer_keyboard(),
        sequence: [
            [0, 0, true, 0],
            [0, 1, true, 10],
            [0, 2, true, 10],
            [0, 2, false, 10],
            [0, 0, false, 10],
            [0, 1, false, 10],
        ],
        expected_effects: [
            layer_on(1),
            layer_on(2),
            layer_on(3),
            press(KeyCode::D),
            release(KeyCode::D),
            layer_off(1),
            layer_off(3),
            layer_off(2),
        ]
    );
}

#[test]
fn test_one_half_only() {
    key_sequence_test!(
        keyboard: create_tri_layer_keyboard(),
        sequence: [
            [0, 1, true, 0],
            [0, 2, true, 10],
            [0, 2, false, 10],
            [0, 1, false, 10],
        ],
        expected_effects: [
            layer_on(2),
            press(KeyCode::C),
            release(KeyCode::C),
            layer_off(2),
        ]
    );
}

#[test]
fn test_tri_layer_with_toggled_half() {
    let keyboard = key_sequence_test!(
        keyboard: create_tri_layer_keyboard(),
        sequence: [
            [0, 3, true, 0],
            [0, 3, false, 10],
            [0, 1, true, 10],
            [0, 2, true, 10],
            [0, 2, false, 10],
        ],
        expected_effects: [
            layer_on(1),
            layer_on(2),
            layer_on(3),
            press(KeyCode::D),
            release(KeyCode::D),
        ]
    );
    let layers = keyboard.state().layers();
    assert!(layers.is_active_in(3, LayerMode::Tri));
    assert!(layers.is_active_in(1, LayerMode::Toggle));
    assert_eq!(layers.highest_layer(), 3);
}
