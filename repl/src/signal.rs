//! Interrupt routing.
//!
//! A [`SignalRegistry`] holds at most one interrupt handler. The statement
//! loop installs a handler for the duration of each dispatch through an
//! [`InterruptGuard`], which turns Ctrl-C into a cancellation request for
//! that statement and puts the previous handler back when dropped.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;

use sqlcli_core::CancelToken;
use tracing::{debug, warn};

/// Exit status of a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

pub type InterruptHandler = Arc<dyn Fn() + Send + Sync>;

static PROCESS_SIGNALS: OnceLock<SignalRegistry> = OnceLock::new();

#[derive(Clone, Default)]
pub struct SignalRegistry {
    handler: Arc<Mutex<Option<InterruptHandler>>>,
}

impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry fed by the process's Ctrl-C.
    ///
    /// The first call starts a listener thread. An interrupt that arrives
    /// while no handler is installed terminates the process.
    pub fn process() -> SignalRegistry {
        PROCESS_SIGNALS
            .get_or_init(|| {
                let registry = SignalRegistry::new();
                forward_ctrl_c(registry.clone());
                registry
            })
            .clone()
    }

    /// Replace the current handler, returning the previous one.
    pub fn replace(&self, handler: Option<InterruptHandler>) -> Option<InterruptHandler> {
        let mut slot = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, handler)
    }

    pub fn is_installed(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Deliver an interrupt. Returns `false` when nobody was listening.
    pub fn raise(&self) -> bool {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

fn forward_ctrl_c(registry: SignalRegistry) {
    let spawned = thread::Builder::new()
        .name("sqlcli-signals".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "Could not start the interrupt listener");
                    return;
                }
            };
            runtime.block_on(async move {
                loop {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "Could not listen for interrupts");
                        return;
                    }
                    debug!("Received interrupt");
                    if !registry.raise() {
                        std::process::exit(INTERRUPTED_EXIT_CODE);
                    }
                }
            });
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Could not spawn the interrupt listener");
    }
}

/// Routes interrupts to a [`CancelToken`] while alive.
#[must_use = "the handler is removed as soon as the guard is dropped"]
pub struct InterruptGuard {
    registry: SignalRegistry,
    previous: Option<InterruptHandler>,
}

impl InterruptGuard {
    pub fn install(registry: &SignalRegistry, cancel: CancelToken) -> Self {
        let previous = registry.replace(Some(Arc::new(move || cancel.cancel())));
        Self {
            registry: registry.clone(),
            previous,
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.registry.replace(self.previous.take());
    }
}
