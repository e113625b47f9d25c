//! Async driver of the [`Keyboard`].
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_time::{Instant, Timer};
use heapless::Vec;

use crate::EFFECT_BUFFER_SIZE;
use crate::effect::Effect;
use crate::event::KeyEvent;
use crate::keyboard::Keyboard;
use crate::storage::LayerStorage;

/// A task which runs forever
#[allow(async_fn_in_trait)]
pub trait Runnable {
    async fn run(&mut self);
}

/// Receives key events from a channel, feeds them to the keyboard and sends the effects out.
///
/// The task sleeps until the next key event or the keyboard's next deadline, whichever comes first.
/// Effects of one loop go to a buffer of [`EFFECT_BUFFER_SIZE`]. Work that does not fit is left
/// with a deadline in the past, so the next loop picks it up without sleeping.
pub struct KeyboardTask<
    'k,
    'a,
    'ch,
    M: RawMutex,
    S: LayerStorage,
    const ROW: usize,
    const COL: usize,
    const NUM_LAYER: usize,
    const EVENT_CAP: usize,
    const EFFECT_CAP: usize,
> {
    keyboard: &'k mut Keyboard<'a, S, ROW, COL, NUM_LAYER>,
    events: Receiver<'ch, M, KeyEvent, EVENT_CAP>,
    effects: Sender<'ch, M, Effect, EFFECT_CAP>,
}

impl<
    'k,
    'a,
    'ch,
    M: RawMutex,
    S: LayerStorage,
    const ROW: usize,
    const COL: usize,
    const NUM_LAYER: usize,
    const EVENT_CAP: usize,
    const EFFECT_CAP: usize,
> KeyboardTask<'k, 'a, 'ch, M, S, ROW, COL, NUM_LAYER, EVENT_CAP, EFFECT_CAP>
{
    pub fn new(
        keyboard: &'k mut Keyboard<'a, S, ROW, COL, NUM_LAYER>,
        events: Receiver<'ch, M, KeyEvent, EVENT_CAP>,
        effects: Sender<'ch, M, Effect, EFFECT_CAP>,
    ) -> Self {
        Self {
            keyboard,
            events,
            effects,
        }
    }

    async fn next_event(&mut self) -> Option<KeyEvent> {
        match self.keyboard.next_deadline() {
            Some(deadline) => match select(Timer::at(deadline), self.events.receive()).await {
                Either::First(_) => None,
                Either::Second(event) => Some(event),
            },
            None => Some(self.events.receive().await),
        }
    }

    async fn send_effects(&mut self, effects: Vec<Effect, EFFECT_BUFFER_SIZE>) {
        for effect in effects {
            self.effects.send(effect).await;
        }
    }
}

impl<
    'k,
    'a,
    'ch,
    M: RawMutex,
    S: LayerStorage,
    const ROW: usize,
    const COL: usize,
    const NUM_LAYER: usize,
    const EVENT_CAP: usize,
    const EFFECT_CAP: usize,
> Runnable for KeyboardTask<'k, 'a, 'ch, M, S, ROW, COL, NUM_LAYER, EVENT_CAP, EFFECT_CAP>
{
    async fn run(&mut self) {
        loop {
            let mut effects: Vec<Effect, EFFECT_BUFFER_SIZE> = Vec::new();
            match self.next_event().await {
                Some(event) => self.keyboard.process(event, &mut effects),
                None => self.keyboard.tick(Instant::now(), &mut effects),
            }
            self.send_effects(effects).await;
        }
    }
}
