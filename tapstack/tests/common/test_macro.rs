/// Run a key sequence and compare the produced effects.
///
/// Each step is `[row, col, pressed, delay_ms]`, `idle` ticks the timers that many
/// milliseconds after the last step.
#[macro_export]
macro_rules! key_sequence_test {
    (
        keyboard: $keyboard:expr,
        sequence: [$([$row:expr, $col:expr, $pressed:expr, $delay:expr]),* $(,)?],
        $(idle: $idle:expr,)?
        expected_effects: [$($effect:expr),* $(,)?]
    ) => {{
        let mut keyboard = $keyboard;
        let sequence = vec![
            $(
                $crate::common::TestKeyPress {
                    row: $row,
                    col: $col,
                    pressed: $pressed,
                    delay: $delay,
                },
            )*
        ];
        let idle: u64 = 0 $(+ $idle)?;
        let effects = $crate::common::run_key_sequence(&mut keyboard, &sequence, idle);
        let expected: Vec<tapstack::effect::Effect> = vec![$($effect),*];
        assert_eq!(expected, effects, "expected left but actually right");
        keyboard
    }};
}
