use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::pipeline::interrupt_signal::InterruptSignal;

/// Latches once the user types `q` followed by Enter.
///
/// A detached helper thread reads lines from the given input; the tracking
/// loop only ever reads the flag, so polling never blocks.
pub struct StdinInterrupt {
    flag: Arc<AtomicBool>,
}

impl StdinInterrupt {
    /// Watches the process's standard input.
    pub fn spawn() -> Self {
        Self::watch(std::io::BufReader::new(std::io::stdin()))
    }

    pub fn watch<R: BufRead + Send + 'static>(input: R) -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        let thread_flag = flag.clone();
        let spawned = thread::Builder::new()
            .name("stdin-interrupt".into())
            .spawn(move || {
                for line in input.lines() {
                    let Ok(line) = line else {
                        break;
                    };
                    if is_quit(&line) {
                        thread_flag.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            log::warn!("Could not watch stdin for 'q': {e}");
        }
        Self { flag }
    }
}

impl InterruptSignal for StdinInterrupt {
    fn requested(&mut self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}
