//! Template resolution - turns a selection into template text
//!
//! Every selection issues a fresh [`RequestToken`] and returns a [`Load`].
//! A load may finish long after the user has moved on; when it does, its
//! result is committed only if its token is still the latest one issued.
//! Older results are dropped, never merged, so overlapping selections can
//! finish in any order without the earlier one clobbering the later one.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::catalog::{TemplateCatalog, TemplateError};
use super::{RequestToken, TemplateLoadState, TemplateSelection, TemplateSource};

/// Everything the resolver publishes, updated atomically
#[derive(Debug, Clone, Default)]
struct Slot {
    latest: RequestToken,
    selection: Option<TemplateSelection>,
    state: TemplateLoadState,
}

/// Resolves template selections into [`TemplateLoadState`]s
///
/// Clones share state: a clone can be moved into a task and still observe
/// and drive the same selection.
#[derive(Clone)]
pub struct TemplateResolver {
    catalog: Arc<dyn TemplateCatalog>,
    slot: Arc<watch::Sender<Slot>>,
}

impl TemplateResolver {
    /// Create an idle resolver backed by `catalog`
    pub fn new(catalog: Arc<dyn TemplateCatalog>) -> Self {
        let (tx, _rx) = watch::channel(Slot::default());
        Self {
            catalog,
            slot: Arc::new(tx),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn TemplateCatalog> {
        &self.catalog
    }

    /// Begin resolving `selection`
    ///
    /// A built-in moves the state to `Loading` and the returned [`Load`]
    /// fetches it. `Custom` moves the state to `Idle` and the returned load
    /// does nothing; text arrives later through [`upload`](Self::upload) or
    /// [`supply_custom`](Self::supply_custom).
    pub fn select(&self, selection: TemplateSelection) -> Load {
        let token = self.issue(|slot, token| {
            slot.selection = Some(selection.clone());
            slot.state = match &selection {
                TemplateSelection::BuiltIn(_) => TemplateLoadState::Loading(token),
                TemplateSelection::Custom => TemplateLoadState::Idle,
            };
        });
        info!(%token, selection = %selection, "template selected");

        match selection {
            TemplateSelection::BuiltIn(id) => {
                let catalog = Arc::clone(&self.catalog);
                let fetch_id = id.clone();
                self.load(token, id, Box::pin(async move { catalog.fetch(&fetch_id).await }))
            }
            TemplateSelection::Custom => Load {
                token,
                label: TemplateSelection::Custom.to_string(),
                work: None,
                pending: false,
                slot: Arc::clone(&self.slot),
            },
        }
    }

    /// Read user-supplied template text for the current custom selection
    ///
    /// `read` is the file-reading capability, e.g.
    /// [`read_file_as_text`](super::read_file_as_text). The state is `Loading`
    /// while the read is pending. The upload gets its own token, so a later
    /// selection or a second upload supersedes it. When the custom source is
    /// not selected the returned load does nothing.
    pub fn upload<F>(&self, read: F) -> Load
    where
        F: Future<Output = Result<String, TemplateError>> + Send + 'static,
    {
        let mut issued = None;
        self.slot.send_if_modified(|slot| {
            if slot.selection != Some(TemplateSelection::Custom) {
                return false;
            }
            let token = slot.latest.next();
            slot.latest = token;
            slot.state = TemplateLoadState::Loading(token);
            issued = Some(token);
            true
        });

        match issued {
            Some(token) => {
                debug!(%token, "custom template upload started");
                self.load(token, TemplateSelection::Custom.to_string(), Box::pin(read))
            }
            None => {
                warn!("upload ignored: custom template is not selected");
                Load {
                    token: self.latest_token(),
                    label: TemplateSelection::Custom.to_string(),
                    work: None,
                    pending: false,
                    slot: Arc::clone(&self.slot),
                }
            }
        }
    }

    /// Provide custom template text that is already in memory
    ///
    /// Returns `false` and changes nothing when the custom source is not
    /// selected.
    pub fn supply_custom(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        let mut supplied = false;
        self.slot.send_if_modified(|slot| {
            if slot.selection != Some(TemplateSelection::Custom) {
                return false;
            }
            slot.latest = slot.latest.next();
            slot.state = TemplateLoadState::Ready(text);
            supplied = true;
            true
        });
        if !supplied {
            warn!("custom text ignored: custom template is not selected");
        }
        supplied
    }

    /// Forget the selection and return to `Idle`, discarding in-flight loads
    pub fn reset(&self) {
        let token = self.issue(|slot, _| {
            slot.selection = None;
            slot.state = TemplateLoadState::Idle;
        });
        debug!(%token, "template resolver reset");
    }

    /// The current load state
    pub fn state(&self) -> TemplateLoadState {
        self.slot.borrow().state.clone()
    }

    /// The current selection, if any
    pub fn selection(&self) -> Option<TemplateSelection> {
        self.slot.borrow().selection.clone()
    }

    /// The template in effect: the selected built-in, or custom text once
    /// it has been supplied
    pub fn source(&self) -> Option<TemplateSource> {
        let slot = self.slot.borrow();
        match (&slot.selection, &slot.state) {
            (Some(TemplateSelection::BuiltIn(id)), _) => Some(TemplateSource::BuiltIn(id.clone())),
            (Some(TemplateSelection::Custom), TemplateLoadState::Ready(text)) => {
                Some(TemplateSource::Custom(text.clone()))
            }
            _ => None,
        }
    }

    /// The most recently issued token
    pub fn latest_token(&self) -> RequestToken {
        self.slot.borrow().latest
    }

    /// Wait until the state is no longer `Loading` and return it
    ///
    /// The pending [`Load`] must be running elsewhere (spawned, or joined
    /// with this future) or be dropped, which settles the state as failed.
    pub async fn settled(&self) -> TemplateLoadState {
        let mut rx = self.slot.subscribe();
        loop {
            {
                let slot = rx.borrow_and_update();
                if !slot.state.is_loading() {
                    return slot.state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    fn issue(&self, update: impl FnOnce(&mut Slot, RequestToken)) -> RequestToken {
        let mut issued = RequestToken::default();
        self.slot.send_modify(|slot| {
            issued = slot.latest.next();
            slot.latest = issued;
            update(slot, issued);
        });
        issued
    }

    fn load(
        &self,
        token: RequestToken,
        label: String,
        work: BoxFuture<'static, Result<String, TemplateError>>,
    ) -> Load {
        Load {
            token,
            label,
            work: Some(work),
            pending: true,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl fmt::Debug for TemplateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("TemplateResolver")
            .field("latest", &slot.latest)
            .field("selection", &slot.selection)
            .field("state", &slot.state)
            .finish()
    }
}

/// A pending template load guarded by its [`RequestToken`]
///
/// Nothing is fetched until the load is [run](Load::run) or
/// [spawned](Load::spawn). Dropping a load that has not finished (never run,
/// or cancelled mid-fetch) commits [`ABANDONED`] as the failure reason if
/// its token is still current, so the state never stays `Loading` with
/// nothing behind it.
#[must_use = "a load does nothing until it is run or spawned"]
pub struct Load {
    token: RequestToken,
    label: String,
    work: Option<BoxFuture<'static, Result<String, TemplateError>>>,
    /// Set while an outcome is still owed to the slot
    pending: bool,
    slot: Arc<watch::Sender<Slot>>,
}

/// Failure reason committed when a load is dropped before finishing
pub const ABANDONED: &str = "template load abandoned";

impl Load {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Whether running this load can change anything
    pub fn is_noop(&self) -> bool {
        self.work.is_none()
    }

    /// Perform the load and commit its outcome if it is still current
    ///
    /// Returns `true` if the outcome was committed.
    pub async fn run(mut self) -> bool {
        let Some(work) = self.work.take() else {
            return false;
        };
        let outcome = work.await;
        self.pending = false;
        commit(&self.slot, self.token, &self.label, Ok(outcome))
    }

    /// Run the load on the tokio runtime
    pub fn spawn(self) -> JoinHandle<bool> {
        tokio::spawn(self.run())
    }
}

impl Drop for Load {
    fn drop(&mut self) {
        if self.pending {
            commit(&self.slot, self.token, &self.label, Err(ABANDONED.to_string()));
        }
    }
}

impl fmt::Debug for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Load")
            .field("token", &self.token)
            .field("label", &self.label)
            .field("noop", &self.work.is_none())
            .finish()
    }
}

/// Outer `Err` means the load was abandoned before its work produced anything
fn commit(
    slot: &watch::Sender<Slot>,
    token: RequestToken,
    label: &str,
    outcome: Result<Result<String, TemplateError>, String>,
) -> bool {
    let mut latest = token;
    let committed = slot.send_if_modified(|slot| {
        latest = slot.latest;
        if slot.latest != token {
            return false;
        }
        slot.state = match outcome {
            Ok(Ok(text)) => {
                info!(%token, template = label, bytes = text.len(), "template ready");
                TemplateLoadState::Ready(text)
            }
            Ok(Err(e)) => {
                warn!(%token, template = label, error = %e, "template load failed");
                TemplateLoadState::Failed(e.to_string())
            }
            Err(reason) => {
                warn!(%token, template = label, "template load dropped before finishing");
                TemplateLoadState::Failed(reason)
            }
        };
        true
    });
    if !committed {
        debug!(%token, %latest, template = label, "discarding stale template load");
    }
    committed
}
