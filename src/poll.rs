//! Bounded polling
//!
//! Every blocking controller operation waits the same way: sample a
//! condition, sleep a fixed interval, give up once the bound has elapsed.
//! [`poll_until`] is that loop.

use embedded_hal::delay::DelayNs;

/// Poll `predicate` until it returns `true` or `timeout_ms` elapses
///
/// The predicate is sampled once before any delay, so a condition that is
/// already satisfied costs no sleep. Elapsed time is counted in whole
/// `interval_ms` steps; an interval of 0 is treated as 1.
///
/// Returns `Ok(true)` when the predicate was satisfied, `Ok(false)` on
/// timeout. Errors from the predicate abort the wait immediately.
///
/// # Example
///
/// ```
/// use embedded_hal::delay::DelayNs;
/// use epd_panel::poll::poll_until;
/// # struct NoDelay;
/// # impl DelayNs for NoDelay { fn delay_ns(&mut self, _ns: u32) {} }
///
/// let mut samples = 0;
/// let done = poll_until(&mut NoDelay, 1, 10, || {
///     samples += 1;
///     Ok::<_, ()>(samples == 3)
/// });
/// assert_eq!(done, Ok(true));
/// ```
pub fn poll_until<D, E, F>(
    delay: &mut D,
    interval_ms: u32,
    timeout_ms: u32,
    mut predicate: F,
) -> Result<bool, E>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, E>,
{
    let interval_ms = interval_ms.max(1);
    let mut elapsed_ms = 0u32;

    loop {
        if predicate()? {
            return Ok(true);
        }
        if elapsed_ms >= timeout_ms {
            return Ok(false);
        }
        delay.delay_ms(interval_ms);
        elapsed_ms = elapsed_ms.saturating_add(interval_ms);
    }
}
