use crate::chart::{self, ChartSpec, Viewport};
use crate::client::{Backend, ClientError, UploadFile};
use crate::convert::{self, ConvertError, Rendered, RenderSource};
use crate::protocol::{HashError, TargetFormat, UploadStatus};
use crate::store::{EqEntry, SessionStore, StoreError};
use crate::tabs::{TabPair, TabPanel};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("backend returned an invalid hash: {0}")]
    InvalidHash(#[from] HashError),
    #[error("speaker {speaker:?} has no EQ named {name:?}")]
    UnknownEq { speaker: String, name: String },
}

/// Identifies one user-triggered flow against the store generation, so a
/// slow response cannot overwrite state installed by a faster, newer flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Itemized result of an upload batch. Rejected files never block their
/// accepted siblings.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub items: Vec<UploadItem>,
}

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub name: String,
    pub accepted: bool,
    pub message: Option<String>,
}

impl UploadReport {
    pub fn accepted_count(&self) -> usize {
        self.items.iter().filter(|i| i.accepted).count()
    }

    pub fn has_rejections(&self) -> bool {
        self.items.iter().any(|i| !i.accepted)
    }
}

/// Chart specs for one entry: the per-stage breakdown and the combined
/// response curve.
#[derive(Debug, Clone)]
pub struct Preview {
    pub name: String,
    pub stages: ChartSpec,
    pub response: ChartSpec,
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub name: String,
    pub rendered: Rendered,
}

/// Session controller: single owner of the entry store and the two tab
/// panels, and the only place that mutates them.
pub struct Session<C> {
    client: C,
    store: SessionStore,
    generation: u64,
    plot_tabs: TabPanel,
    convert_tabs: TabPanel,
}

impl<C: Backend> Session<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            store: SessionStore::new(),
            generation: 0,
            plot_tabs: TabPanel::new(),
            convert_tabs: TabPanel::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn plot_tabs(&self) -> &TabPanel {
        &self.plot_tabs
    }

    pub fn plot_tabs_mut(&mut self) -> &mut TabPanel {
        &mut self.plot_tabs
    }

    pub fn convert_tabs(&self) -> &TabPanel {
        &self.convert_tabs
    }

    pub fn convert_tabs_mut(&mut self) -> &mut TabPanel {
        &mut self.convert_tabs
    }

    /// Start a new user-triggered flow. Any response still in flight for an
    /// earlier token is stale from this point on.
    pub fn begin(&mut self) -> RequestToken {
        self.generation += 1;
        RequestToken(self.generation)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.generation
    }

    /// Replace the store contents with `entries` and rebuild both tab
    /// panels. Returns false (and changes nothing) when `token` has been
    /// superseded by a newer flow.
    pub fn commit_entries(&mut self, token: RequestToken, entries: Vec<EqEntry>) -> bool {
        if !self.is_current(token) {
            warn!(
                token = token.0,
                generation = self.generation,
                "discarding stale response"
            );
            return false;
        }
        self.store.reset();
        for entry in entries {
            self.store.append(entry);
        }
        self.rebuild_tabs();
        true
    }

    fn panel_pairs(&self, panel_prefix: &str) -> Vec<TabPair> {
        self.store
            .iter()
            .enumerate()
            .map(|(k, entry)| TabPair {
                tab_id: format!("name{k}"),
                panel_id: format!("{panel_prefix}{k}"),
                label: entry.name().to_string(),
            })
            .collect()
    }

    fn rebuild_tabs(&mut self) {
        let plot_pairs = self.panel_pairs("plot");
        self.plot_tabs.rebuild(plot_pairs);
        let convert_pairs = self.panel_pairs("convert");
        self.convert_tabs.rebuild(convert_pairs);
    }

    /// Upload an EQ file batch and make the accepted files the new working
    /// set. A file the backend rejects, or whose returned hash fails
    /// validation, is reported and skipped.
    pub async fn upload(&mut self, files: Vec<UploadFile>) -> Result<UploadReport, SessionError> {
        let token = self.begin();
        let outcomes = self.client.upload(files).await?;

        let mut entries = Vec::new();
        let mut items = Vec::new();
        for outcome in outcomes {
            let name = outcome.name.clone().unwrap_or_else(|| "eq".to_string());
            let accepted = match outcome.status {
                UploadStatus::Ok => {
                    let hash = outcome.hash.as_deref().unwrap_or_default();
                    match EqEntry::new(hash, name.clone()) {
                        Ok(entry) => {
                            entries.push(entry);
                            Ok(())
                        }
                        Err(e) => {
                            warn!(name = %name, error = %e, "rejecting uploaded entry");
                            Err(e.to_string())
                        }
                    }
                }
                UploadStatus::Failed => {
                    let message = outcome
                        .message
                        .clone()
                        .unwrap_or_else(|| "upload failed".to_string());
                    warn!(name = %name, message = %message, "backend rejected upload");
                    Err(message)
                }
            };
            items.push(UploadItem {
                name,
                accepted: accepted.is_ok(),
                message: accepted.err(),
            });
        }

        self.commit_entries(token, entries);
        Ok(UploadReport { items })
    }

    /// Make one of a speaker's predefined EQs the working set. The entry is
    /// displayed as "{speaker} - {eq}".
    pub async fn select_speaker_eq(
        &mut self,
        speaker: &str,
        eq_name: &str,
    ) -> Result<(), SessionError> {
        let token = self.begin();
        let eqs = self.client.speaker_eqdata(speaker).await?;
        let Some(eq) = eqs
            .iter()
            .find(|e| e.name == eq_name || e.display_name.as_deref() == Some(eq_name))
        else {
            return Err(SessionError::UnknownEq {
                speaker: speaker.to_string(),
                name: eq_name.to_string(),
            });
        };
        let entry = EqEntry::new(&eq.hash, format!("{speaker} - {eq_name}"))?;
        self.commit_entries(token, vec![entry]);
        Ok(())
    }

    /// Fetch chart previews for every entry, in store order. A fetch failure
    /// is logged and leaves that entry without a preview; the others still
    /// render.
    pub async fn chart_previews(&self, viewport: Viewport) -> Result<Vec<Preview>, SessionError> {
        let mut previews = Vec::new();
        for entry in self.store.iter() {
            let details = match self.client.graph_spl_details(entry.hash()).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(entry = entry.name(), error = %e, "stage graph fetch failed");
                    continue;
                }
            };
            let graph = match self.client.graph_spl(entry.hash()).await {
                Ok(graph) => graph,
                Err(e) => {
                    warn!(entry = entry.name(), error = %e, "response graph fetch failed");
                    continue;
                }
            };
            previews.push(Preview {
                name: entry.name().to_string(),
                stages: chart::stage_chart(&details, viewport),
                response: chart::response_chart(&graph, viewport),
            });
        }
        Ok(previews)
    }

    /// Convert every entry to `format`, in store order. Entries are rendered
    /// strictly one after another so each artifact is complete before the
    /// next starts. For room correction the partner channel is positional:
    /// entry k pairs with k+1, the last entry wraps to the first.
    pub async fn convert(&mut self, format: TargetFormat) -> Result<Vec<Conversion>, SessionError> {
        let mut conversions = Vec::new();
        for k in 0..self.store.count() {
            let entry = self.store.entry_at(k)?;
            let rendered = if format.needs_pair() {
                let partner_index = if k + 1 < self.store.count() { k + 1 } else { 0 };
                let partner = self.store.entry_at(partner_index)?;
                debug!(
                    entry = entry.name(),
                    partner = partner.name(),
                    "room pairing"
                );
                convert::render(
                    &self.client,
                    format,
                    entry.name(),
                    RenderSource::Pair {
                        left: entry.hash(),
                        right: partner.hash(),
                    },
                )
                .await
            } else {
                convert::render(
                    &self.client,
                    format,
                    entry.name(),
                    RenderSource::Single(entry.hash()),
                )
                .await
            };
            match rendered {
                Ok(rendered) => conversions.push(Conversion {
                    name: entry.name().to_string(),
                    rendered,
                }),
                Err(e) => {
                    warn!(entry = entry.name(), error = %e, "conversion failed");
                }
            }
        }
        // Re-wire the conversion panel: the first tab is the visible one
        // again once the artifacts are in place.
        let convert_pairs = self.panel_pairs("convert");
        self.convert_tabs.rebuild(convert_pairs);
        Ok(conversions)
    }
}
