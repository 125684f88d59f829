use std::time::Duration;
use trice::Instant;

/// Mark every item inside as `#[cfg(test)]`.
macro_rules! cfg_test {
    ($($item:item)*) => {
        $(
            #[cfg(test)]
            $item
        )*
    }
}

/// Logs how long it lived, at `debug` level under the `farkle::timing` target,
/// when dropped.
pub(crate) struct Timer {
    location: &'static str,
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub(crate) fn start(location: &'static str, label: &'static str) -> Self {
        Self {
            location,
            label,
            start: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!(
            target: "farkle::timing",
            "[{}] {}: took {:?}",
            self.location,
            self.label,
            self.elapsed(),
        );
    }
}

/// Evaluate a block or expression, logging how long it took.
///
/// ```ignore
/// let table = time!("bust odds", { build_table() });
/// ```
macro_rules! time {
    ($label:expr, $b:block) => {{
        let _timer = $crate::macros::Timer::start(
            ::std::concat!(::std::file!(), ":", ::std::line!()),
            $label,
        );
        $b
    }};
    ($label:expr, $e:expr) => {{
        time!($label, { $e })
    }};
}
