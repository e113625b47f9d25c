pub mod test_macro;

use embassy_time::{Duration, Instant};
use tapstack::action::KeyAction;
use tapstack::config::BehaviorConfig;
use tapstack::effect::{Effect, EffectSink};
use tapstack::event::{KeyEvent, KeyPos};
use tapstack::keyboard::Keyboard;
use tapstack::keycode::KeyCode;
use tapstack::keymap::KeyMap;
use tapstack::modifier::ModifierCombination;
use tapstack::storage::{LayerStorage, NoStorage};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

#[derive(Debug, Clone)]
pub struct TestKeyPress {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    pub delay: u64, // Delay before this key event in milliseconds
}

/// Collects every effect in order
#[derive(Debug, Default)]
pub struct Recorder(pub Vec<Effect>);

impl EffectSink for Recorder {
    fn emit(&mut self, effect: Effect) {
        self.0.push(effect);
    }
}

/// Build a keyboard without persistent storage, the keymap is leaked to get the `'static` lifetime
pub fn create_keyboard<const ROW: usize, const COL: usize, const NUM_LAYER: usize>(
    layers: [[[KeyAction; COL]; ROW]; NUM_LAYER],
    behavior: BehaviorConfig,
) -> Keyboard<'static, NoStorage, ROW, COL, NUM_LAYER> {
    create_keyboard_with_storage(layers, behavior, NoStorage)
}

pub fn create_keyboard_with_storage<S: LayerStorage, const ROW: usize, const COL: usize, const NUM_LAYER: usize>(
    layers: [[[KeyAction; COL]; ROW]; NUM_LAYER],
    behavior: BehaviorConfig,
    storage: S,
) -> Keyboard<'static, S, ROW, COL, NUM_LAYER> {
    let layers: &'static [[[KeyAction; COL]; ROW]; NUM_LAYER] = Box::leak(Box::new(layers));
    let keymap = KeyMap::new(layers, behavior).expect("invalid keymap");
    Keyboard::new(keymap, storage)
}

/// Feed the key sequence to the keyboard, starting at time 0.
///
/// After the last event, timers are ticked `idle` milliseconds later if `idle` is not 0.
pub fn run_key_sequence<S: LayerStorage, const ROW: usize, const COL: usize, const NUM_LAYER: usize>(
    keyboard: &mut Keyboard<'_, S, ROW, COL, NUM_LAYER>,
    sequence: &[TestKeyPress],
    idle: u64,
) -> Vec<Effect> {
    let mut now = Instant::from_millis(0);
    let mut recorder = Recorder::default();
    for key in sequence {
        now += Duration::from_millis(key.delay);
        let event = KeyEvent::new(KeyPos::new(key.row, key.col), key.pressed, now);
        keyboard.process(event, &mut recorder);
    }
    if idle > 0 {
        keyboard.tick(now + Duration::from_millis(idle), &mut recorder);
    }
    recorder.0
}

pub fn press(code: KeyCode) -> Effect {
    Effect::key_press(code)
}

pub fn release(code: KeyCode) -> Effect {
    Effect::key_release(code)
}

pub fn mod_set(modifiers: ModifierCombination) -> Effect {
    Effect::modifier_set(modifiers)
}

pub fn mod_clear(modifiers: ModifierCombination) -> Effect {
    Effect::modifier_clear(modifiers)
}

pub fn layer_on(layer: u8) -> Effect {
    Effect::LayerActivated(layer)
}

pub fn layer_off(layer: u8) -> Effect {
    Effect::LayerDeactivated(layer)
}
