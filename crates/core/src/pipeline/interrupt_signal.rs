/// User-requested stop, polled once per frame by the tracking loop.
pub trait InterruptSignal: Send {
    fn requested(&mut self) -> bool;
}

/// Never asks to stop. Used for non-interactive runs and tests.
pub struct NeverInterrupt;

impl InterruptSignal for NeverInterrupt {
    fn requested(&mut self) -> bool {
        false
    }
}
