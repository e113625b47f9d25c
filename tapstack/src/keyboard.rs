pub(crate) mod held_buffer;
pub(crate) mod oneshot;

use embassy_time::Instant;
use heapless::Vec;
use tapstack_types::action::{Action, KeyAction};

use crate::config::HoldMode;
use crate::effect::{Effect, EffectSink};
use crate::event::{KeyEvent, KeyPos};
use crate::keyboard::held_buffer::BufferedDecision;
use crate::keymap::KeyMap;
use crate::layer_stack::LayerMode;
use crate::state::FirmwareState;
use crate::storage::{DefaultLayerStore, LayerStorage};
use crate::tap_dance::TapDanceRelease;
use crate::tap_hold::DualRoleState;
use crate::{DUAL_ROLE_MAX_NUM, MAX_EVENT_EFFECTS, TAP_DANCE_MAX_NUM};

/// A running timer, which resolves something when it expires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Timer {
    DualRole(KeyPos),
    TapDance(u8),
    OneShot,
    /// Buffered events can be replayed
    Replay,
}

/// The event dispatcher.
///
/// Key events are fed one at a time with [`Keyboard::process`], timers are
/// driven by [`Keyboard::tick`]. Both push the resulting effects, in order, to
/// an [`EffectSink`].
pub struct Keyboard<'a, S: LayerStorage, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    keymap: KeyMap<'a, ROW, COL, NUM_LAYER>,
    state: FirmwareState<S, ROW, COL>,
}

impl<'a, S: LayerStorage, const ROW: usize, const COL: usize, const NUM_LAYER: usize>
    Keyboard<'a, S, ROW, COL, NUM_LAYER>
{
    /// Create the keyboard, the default layer is loaded from `storage`
    pub fn new(keymap: KeyMap<'a, ROW, COL, NUM_LAYER>, storage: S) -> Self {
        let mut default_layer = DefaultLayerStore::new(storage, keymap.behavior.default_layer);
        default_layer.load(|l| keymap.is_base_capable(l));
        Self {
            state: FirmwareState::new(default_layer),
            keymap,
        }
    }

    pub fn keymap(&self) -> &KeyMap<'a, ROW, COL, NUM_LAYER> {
        &self.keymap
    }

    pub fn state(&self) -> &FirmwareState<S, ROW, COL> {
        &self.state
    }

    pub fn default_layer(&self) -> u8 {
        self.state.default_layer()
    }

    pub fn is_layer_active(&self, layer: u8) -> bool {
        self.state.layers.is_active(layer)
    }

    /// Stop the keyboard and give the storage back
    pub fn into_storage(self) -> S {
        self.state.default_layer.into_storage()
    }

    /// Process a key event.
    ///
    /// Timers which expire up to the time of the event are resolved first.
    /// If the sink fills up before that, the event is buffered and handled by
    /// a later [`Keyboard::tick`], which is due immediately.
    pub fn process<E: EffectSink>(&mut self, event: KeyEvent, sink: &mut E) {
        if !self.keymap.contains(event.pos) {
            warn!("Key event out of the matrix: {:?}", event);
            return;
        }
        debug!("Processing key event: {:?}", event);
        self.expire(event.time, sink);

        if self.must_buffer(&event, sink) {
            self.buffer_event(event, sink);
            return;
        }

        self.handle_event(event, sink);
        self.flush_held_buffer(sink);
    }

    fn must_buffer<E: EffectSink>(&self, event: &KeyEvent, sink: &E) -> bool {
        // Earlier timers or buffered events are still waiting for room in the sink
        let stalled = sink.remaining() < MAX_EVENT_EFFECTS || self.next_deadline().is_some_and(|d| d <= event.time);
        if stalled {
            return true;
        }
        if self.keymap.behavior.tap_hold.mode == HoldMode::Timeout && self.state.dual_role.has_pending() {
            let own_release =
                !event.pressed && matches!(self.state.dual_role.state(event.pos), DualRoleState::Pending { .. });
            return !own_release;
        }
        false
    }

    /// Resolve every timer which expires at or before `now`
    pub fn tick<E: EffectSink>(&mut self, now: Instant, sink: &mut E) {
        self.expire(now, sink);
    }

    /// When `tick` has to be called next, `None` if no timer is running
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_timer().map(|(deadline, _)| deadline)
    }

    fn next_timer(&self) -> Option<(Instant, Timer)> {
        let behavior = &self.keymap.behavior;
        let pending = self.state.dual_role.next_deadline(behavior.tap_hold.timeout);
        let dual_role = pending.map(|(pos, d)| (d, Timer::DualRole(pos)));
        let tap_dance = self
            .state
            .tap_dance
            .next_deadline(&behavior.tap_dance)
            .map(|(id, d)| (d, Timer::TapDance(id)));
        let one_shot = self
            .state
            .one_shot
            .deadline(behavior.one_shot.timeout)
            .map(|d| (d, Timer::OneShot));
        let replay = self.state.held_buffer.replay_time(pending).map(|t| (t, Timer::Replay));

        [dual_role, tap_dance, one_shot, replay]
            .into_iter()
            .flatten()
            .min_by_key(|(d, _)| *d)
    }

    fn expire<E: EffectSink>(&mut self, now: Instant, sink: &mut E) {
        while let Some((deadline, timer)) = self.next_timer() {
            if deadline > now {
                break;
            }
            if sink.remaining() < MAX_EVENT_EFFECTS {
                debug!("Effect sink is full, timer {:?} waits for the next tick", timer);
                break;
            }
            debug!("Timer {:?} expired at {:?}", timer, deadline);
            match timer {
                Timer::DualRole(pos) => {
                    self.decide_hold(pos, deadline, sink);
                    self.flush_held_buffer(sink);
                }
                Timer::TapDance(id) => self.resolve_tap_dance(id, deadline, sink),
                Timer::OneShot => self.end_one_shot(sink),
                Timer::Replay => self.flush_held_buffer(sink),
            }
        }
    }

    fn buffer_event<E: EffectSink>(&mut self, event: KeyEvent, sink: &mut E) {
        if self.state.held_buffer.is_full() && sink.remaining() >= MAX_EVENT_EFFECTS {
            warn!("Held buffer is full, pending dual-role keys become hold");
            self.decide_all_holds(event.time, sink);
            self.flush_held_buffer(sink);
        }
        if let Err(e) = self.state.held_buffer.push(event) {
            error!("Held buffer overflowed, dropping {:?}", e);
            return;
        }
        self.flush_held_buffer(sink);
    }

    /// Replay buffered events until the buffer is empty, a dual-role key is undecided again,
    /// or the sink has no room for another event
    fn flush_held_buffer<E: EffectSink>(&mut self, sink: &mut E) {
        loop {
            if sink.remaining() < MAX_EVENT_EFFECTS {
                if !self.state.held_buffer.is_empty() {
                    debug!("Effect sink is full, {} buffered events wait", self.state.held_buffer.len());
                }
                break;
            }
            match self.state.dual_role.next_deadline(self.keymap.behavior.tap_hold.timeout) {
                None => {
                    let Some(event) = self.state.held_buffer.pop() else {
                        break;
                    };
                    debug!("Replaying buffered key event: {:?}", event);
                    self.handle_event(event, sink);
                }
                Some((pos, deadline)) => match self.state.held_buffer.take_decision(pos, deadline) {
                    Some(BufferedDecision::Released(event)) => self.handle_event(event, sink),
                    Some(BufferedDecision::Timeout) => self.decide_hold(pos, deadline, sink),
                    None => break,
                },
            }
        }
    }

    fn handle_event<E: EffectSink>(&mut self, event: KeyEvent, sink: &mut E) {
        if event.pressed {
            self.handle_press(event, sink);
        } else {
            self.handle_release(event, sink);
        }
    }

    fn handle_press<E: EffectSink>(&mut self, event: KeyEvent, sink: &mut E) {
        let pos = event.pos;
        self.interrupt(pos, event.time, sink);

        let (action, layer) = self.state.layers.resolve(&self.keymap, pos);
        if let Some(slot) = self.state.cache_slot(pos) {
            if slot.replace(layer).is_some() {
                warn!("Key {:?} is pressed again without release", pos);
            }
        }

        // A one-shot layer is used by exactly one key press
        if let Some(one_shot) = self.state.one_shot.active() {
            if one_shot.pos != pos {
                self.end_one_shot(sink);
            }
        }

        match action {
            KeyAction::No | KeyAction::Transparent => {}
            KeyAction::Single(a) => self.press_action(a, pos, event.time, sink),
            KeyAction::TapHold(tap, hold) => {
                if self.state.dual_role.press(pos, tap, hold, event.time).is_err() {
                    error!("Too many dual-role keys are pressed, {:?} is ignored", pos);
                }
            }
            KeyAction::TapDance(id) => {
                self.state.tap_dance.press(id, pos, event.time);
            }
        }
    }

    fn handle_release<E: EffectSink>(&mut self, event: KeyEvent, sink: &mut E) {
        let pos = event.pos;
        let Some(layer) = self.state.cache_slot(pos).and_then(|slot| slot.take()) else {
            debug!("Release of {:?} without press, ignored", pos);
            return;
        };

        match self.keymap.action_at(layer, pos) {
            KeyAction::No | KeyAction::Transparent => {}
            KeyAction::Single(a) => self.release_action(a, sink),
            KeyAction::TapHold(_, _) => match self.state.dual_role.release(pos) {
                Some((DualRoleState::TapDecided, tap)) => {
                    debug!("Dual-role key {:?} tapped", pos);
                    self.tap_action(tap, pos, event.time, sink);
                }
                Some((_, hold)) => self.release_action(hold, sink),
                None => warn!("Dual-role key {:?} released but not found", pos),
            },
            KeyAction::TapDance(id) => match self.state.tap_dance.release(id, event.time) {
                TapDanceRelease::Finished(Some(a)) => self.release_action(a, sink),
                TapDanceRelease::Finished(None) | TapDanceRelease::Counted => {}
                TapDanceRelease::Ignored => debug!("Tap dance {} released without press", id),
            },
        }
    }

    /// A key press at `pos` resolves undecided keys at other positions, oldest first
    fn interrupt<E: EffectSink>(&mut self, pos: KeyPos, now: Instant, sink: &mut E) {
        let mut pending: Vec<(Instant, Timer), { DUAL_ROLE_MAX_NUM + TAP_DANCE_MAX_NUM }> = Vec::new();
        if self.keymap.behavior.tap_hold.mode == HoldMode::HoldOnOtherPress {
            for (p, pressed_at) in self.state.dual_role.pending_except(pos) {
                let _ = pending.push((pressed_at, Timer::DualRole(p)));
            }
        }
        for (id, since) in self.state.tap_dance.counting_except(pos) {
            let _ = pending.push((since, Timer::TapDance(id)));
        }
        pending.sort_unstable_by_key(|(t, _)| *t);

        for (_, timer) in pending {
            match timer {
                Timer::DualRole(p) => self.decide_hold(p, now, sink),
                Timer::TapDance(id) => self.resolve_tap_dance(id, now, sink),
                Timer::OneShot | Timer::Replay => {}
            }
        }
    }

    fn decide_hold<E: EffectSink>(&mut self, pos: KeyPos, now: Instant, sink: &mut E) {
        if let Some(hold) = self.state.dual_role.decide_hold(pos) {
            debug!("Dual-role key {:?} is held", pos);
            self.press_action(hold, pos, now, sink);
        }
    }

    fn decide_all_holds<E: EffectSink>(&mut self, now: Instant, sink: &mut E) {
        let mut pending: Vec<(Instant, KeyPos), DUAL_ROLE_MAX_NUM> = self
            .state
            .dual_role
            .pending()
            .map(|(pos, t)| (t, pos))
            .collect();
        pending.sort_unstable();
        for (_, pos) in pending {
            self.decide_hold(pos, now, sink);
        }
    }

    fn resolve_tap_dance<E: EffectSink>(&mut self, id: u8, now: Instant, sink: &mut E) {
        let Some(resolution) = self.state.tap_dance.resolve(id, self.keymap.tap_dances()) else {
            return;
        };
        if resolution.action.is_held_state() {
            self.press_action(resolution.action, resolution.pos, now, sink);
        } else {
            self.tap_action(resolution.action, resolution.pos, now, sink);
        }
    }

    fn press_action<E: EffectSink>(&mut self, action: Action, pos: KeyPos, now: Instant, sink: &mut E) {
        match action {
            Action::No => {}
            Action::Key(code) => sink.emit(Effect::key_press(code)),
            Action::Modifier(modifiers) => sink.emit(Effect::modifier_set(modifiers)),
            Action::KeyWithModifier(code, modifiers) => {
                sink.emit(Effect::modifier_set(modifiers));
                sink.emit(Effect::key_press(code));
            }
            Action::LayerOn(layer) => self.layer_on(layer, LayerMode::Momentary, sink),
            Action::LayerToggle(layer) => self.toggle_layer(layer, sink),
            Action::LayerOneShot(layer) => self.start_one_shot(layer, pos, now, sink),
            Action::DefaultLayer(layer) => self.set_default_layer(layer, sink),
        }
    }

    fn release_action<E: EffectSink>(&mut self, action: Action, sink: &mut E) {
        match action {
            Action::Key(code) => sink.emit(Effect::key_release(code)),
            Action::Modifier(modifiers) => sink.emit(Effect::modifier_clear(modifiers)),
            Action::KeyWithModifier(code, modifiers) => {
                sink.emit(Effect::key_release(code));
                sink.emit(Effect::modifier_clear(modifiers));
            }
            Action::LayerOn(layer) => self.layer_off(layer, LayerMode::Momentary, sink),
            Action::No | Action::LayerToggle(_) | Action::LayerOneShot(_) | Action::DefaultLayer(_) => {}
        }
    }

    fn tap_action<E: EffectSink>(&mut self, action: Action, pos: KeyPos, now: Instant, sink: &mut E) {
        self.press_action(action, pos, now, sink);
        self.release_action(action, sink);
    }

    fn layer_on<E: EffectSink>(&mut self, layer: u8, mode: LayerMode, sink: &mut E) {
        let was_active = self.state.layers.is_active(layer);
        if let Err(e) = self.state.layers.activate(layer, mode) {
            error!("Failed to activate layer {}: {:?}", layer, e);
            return;
        }
        self.emit_layer_change(layer, was_active, sink);
        self.update_tri_layer(sink);
    }

    fn layer_off<E: EffectSink>(&mut self, layer: u8, mode: LayerMode, sink: &mut E) {
        let was_active = self.state.layers.is_active(layer);
        if !self.state.layers.deactivate(layer, mode) {
            debug!("Layer {} is not active in {:?} mode", layer, mode);
            return;
        }
        self.emit_layer_change(layer, was_active, sink);
        self.update_tri_layer(sink);
    }

    fn toggle_layer<E: EffectSink>(&mut self, layer: u8, sink: &mut E) {
        let was_active = self.state.layers.is_active(layer);
        if let Err(e) = self.state.layers.toggle(layer) {
            error!("Failed to toggle layer {}: {:?}", layer, e);
            return;
        }
        self.emit_layer_change(layer, was_active, sink);
        self.update_tri_layer(sink);
    }

    fn update_tri_layer<E: EffectSink>(&mut self, sink: &mut E) {
        let Some(tri) = self.keymap.behavior.tri_layer else {
            return;
        };
        let was_active = self.state.layers.is_active(tri.adjust);
        if let Err(e) = tri.update(&mut self.state.layers) {
            error!("Failed to update tri layer: {:?}", e);
        }
        self.emit_layer_change(tri.adjust, was_active, sink);
    }

    fn emit_layer_change<E: EffectSink>(&self, layer: u8, was_active: bool, sink: &mut E) {
        match (was_active, self.state.layers.is_active(layer)) {
            (false, true) => sink.emit(Effect::LayerActivated(layer)),
            (true, false) => sink.emit(Effect::LayerDeactivated(layer)),
            _ => {}
        }
    }

    fn start_one_shot<E: EffectSink>(&mut self, layer: u8, pos: KeyPos, now: Instant, sink: &mut E) {
        if let Some(active) = self.state.one_shot.active() {
            if active.layer == layer {
                // Pressing the one-shot key again restarts the timeout
                self.state.one_shot.start(layer, pos, now);
                return;
            }
            self.end_one_shot(sink);
        }
        self.state.one_shot.start(layer, pos, now);
        self.layer_on(layer, LayerMode::OneShot, sink);
    }

    fn end_one_shot<E: EffectSink>(&mut self, sink: &mut E) {
        if let Some(one_shot) = self.state.one_shot.take() {
            debug!("One-shot layer {} ends", one_shot.layer);
            self.layer_off(one_shot.layer, LayerMode::OneShot, sink);
        }
    }

    fn set_default_layer<E: EffectSink>(&mut self, layer: u8, sink: &mut E) {
        if !self.keymap.is_base_capable(layer) {
            warn!("Layer {} can't be the default layer", layer);
            return;
        }
        if self.state.default_layer.set(layer) {
            info!("Default layer set to {}", layer);
            self.state.layers.set_default_layer(layer);
            sink.emit(Effect::DefaultLayerChanged(layer));
        }
    }
}
