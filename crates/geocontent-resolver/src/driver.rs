//! Long-lived owner of a resolution state.
//!
//! `GeoContent` re-runs the resolver only when its inputs change and makes
//! sure a superseded attempt can never overwrite the state of a newer one:
//! every attempt carries a generation number and a cancellation token, and
//! it commits only while its generation is still the current one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::content::ContentSource;
use crate::resolver::RegionResolver;
use crate::state::ResolutionState;

struct Inputs {
    default_region: String,
    source: Arc<dyn ContentSource>,
}

impl Inputs {
    fn matches(&self, default_region: &str, source: &Arc<dyn ContentSource>) -> bool {
        self.default_region == default_region && same_source(&self.source, source)
    }
}

/// Identity of the source object, ignoring vtable pointers.
fn same_source(a: &Arc<dyn ContentSource>, b: &Arc<dyn ContentSource>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[derive(Default)]
struct Attempt {
    inputs: Option<Inputs>,
    cancel: Option<CancellationToken>,
}

pub struct GeoContent {
    resolver: Arc<RegionResolver>,
    state_tx: Arc<watch::Sender<ResolutionState>>,
    generation: Arc<AtomicU64>,
    attempt: Mutex<Attempt>,
}

impl GeoContent {
    /// Create the driver and start the first attempt.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        resolver: RegionResolver,
        default_region: &str,
        source: Arc<dyn ContentSource>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ResolutionState::initial(default_region));
        let driver = Self {
            resolver: Arc::new(resolver),
            state_tx: Arc::new(state_tx),
            generation: Arc::new(AtomicU64::new(0)),
            attempt: Mutex::new(Attempt::default()),
        };
        driver.update(default_region, source);
        driver
    }

    /// Feed the current inputs. Starts a new attempt only if the default
    /// region or the source object differ from the previous call; returns
    /// whether one was started.
    pub fn update(&self, default_region: &str, source: Arc<dyn ContentSource>) -> bool {
        let mut attempt = self.attempt.lock();

        if let Some(inputs) = &attempt.inputs {
            if inputs.matches(default_region, &source) {
                tracing::trace!("Inputs unchanged; keeping current resolution");
                return false;
            }
        }

        if let Some(previous) = attempt.cancel.take() {
            previous.cancel();
        }

        // Bump before resetting so a stale attempt fails its check either
        // way: before the reset it is overwritten, after it is rejected.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state_tx
            .send_replace(ResolutionState::initial(default_region));

        let token = CancellationToken::new();
        attempt.cancel = Some(token.clone());
        attempt.inputs = Some(Inputs {
            default_region: default_region.to_string(),
            source: source.clone(),
        });
        drop(attempt);

        tracing::info!(generation, default_region, "Starting region resolution");

        let resolver = self.resolver.clone();
        let state_tx = self.state_tx.clone();
        let current = self.generation.clone();
        let default_region = default_region.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(generation, "Resolution attempt cancelled");
                }
                settled = resolver.resolve(&default_region, source.as_ref()) => {
                    let committed = state_tx.send_if_modified(|state| {
                        if current.load(Ordering::SeqCst) != generation {
                            return false;
                        }
                        *state = settled;
                        true
                    });
                    if !committed {
                        tracing::debug!(generation, "Discarding result of superseded attempt");
                    }
                }
            }
        });

        true
    }

    /// Latest snapshot
    pub fn state(&self) -> ResolutionState {
        self.state_tx.borrow().clone()
    }

    /// Receiver observing every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
        self.state_tx.subscribe()
    }

    /// Wait until the current attempt has settled.
    ///
    /// Waits forever if the attempt was stopped with `cancel`.
    pub async fn settled(&self) -> ResolutionState {
        let mut rx = self.state_tx.subscribe();
        let result = rx.wait_for(ResolutionState::is_settled).await.map(|s| s.clone());
        match result {
            Ok(state) => state,
            // The sender lives in `self`, so this only happens during teardown
            Err(_) => self.state(),
        }
    }

    /// Number of attempts started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stop the in-flight attempt without starting a new one. Its result is
    /// discarded; the state stays as it is.
    pub fn cancel(&self) {
        let mut attempt = self.attempt.lock();
        if let Some(token) = attempt.cancel.take() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            token.cancel();
            tracing::info!("Region resolution cancelled");
        }
        attempt.inputs = None;
    }
}

impl Drop for GeoContent {
    fn drop(&mut self) {
        if let Some(token) = self.attempt.get_mut().cancel.take() {
            token.cancel();
        }
    }
}
