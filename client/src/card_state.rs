use std::sync::Arc;

use rivers_shared::{RiverDetail, RiverLevel, RunnableKey, latest_value, runnable_key, slugify};

use crate::error::ClientError;
use crate::ordering::CardSortInfo;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    Empty,
    Error(String),
}

impl LoadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadPhase::Ready | LoadPhase::Empty | LoadPhase::Error(_))
    }
}

/// Proof that a load was started; only the newest ticket can finish it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Data lifecycle of one river card.
#[derive(Debug, Clone)]
pub struct CardState {
    detail: RiverDetail,
    phase: LoadPhase,
    levels: Arc<[RiverLevel]>,
    load_completed: bool,
    generation: u64,
    loaded_site: Option<String>,
    detached: bool,
}

impl CardState {
    /// Rivers without a gauge have nothing to load and start out Empty.
    pub fn new(detail: RiverDetail) -> Self {
        let ungauged = !detail.has_gauge();
        Self {
            detail,
            phase: if ungauged { LoadPhase::Empty } else { LoadPhase::Idle },
            levels: Arc::from(Vec::new()),
            load_completed: ungauged,
            generation: 0,
            loaded_site: None,
            detached: false,
        }
    }

    pub fn detail(&self) -> &RiverDetail {
        &self.detail
    }

    pub fn identifier(&self) -> String {
        self.detail.identifier()
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn levels(&self) -> &Arc<[RiverLevel]> {
        &self.levels
    }

    pub fn latest(&self) -> Option<&RiverLevel> {
        self.levels.last()
    }

    /// Idle counts as loading: every gauged card starts a fetch on mount.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Idle | LoadPhase::Loading)
    }

    /// Latches on the first terminal transition and never resets.
    pub fn is_load_complete(&self) -> bool {
        self.load_completed
    }

    pub fn display_name(&self) -> &str {
        if !self.detail.site_name.is_empty() {
            &self.detail.site_name
        } else if !self.detail.site_code.is_empty() {
            &self.detail.site_code
        } else {
            "Loading..."
        }
    }

    pub fn slug(&self) -> String {
        slugify(self.display_name())
    }

    pub fn runnable_key(&self) -> RunnableKey {
        let range = self.detail.advised_range();
        runnable_key(
            latest_value(&self.levels),
            range.low,
            range.high,
            self.is_loading(),
            self.phase == LoadPhase::Empty,
        )
    }

    pub fn sort_info(&self) -> CardSortInfo {
        CardSortInfo {
            id: self.identifier(),
            display_name: self.display_name().to_string(),
            runnable_key: self.runnable_key(),
            load_completed: self.is_load_complete(),
        }
    }

    /// Start a fetch for the current inputs. Returns `None` while a load is
    /// already in flight, after detach, when the inputs were already loaded,
    /// and for rivers without a gauge.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.detached || self.phase == LoadPhase::Loading || !self.detail.has_gauge() {
            return None;
        }
        if self.phase.is_terminal()
            && self.loaded_site.as_deref() == Some(self.detail.site_code.as_str())
        {
            return None;
        }

        self.generation += 1;
        self.phase = LoadPhase::Loading;
        self.loaded_site = Some(self.detail.site_code.clone());
        Some(LoadTicket {
            generation: self.generation,
        })
    }

    /// Apply a fetch result. Stale tickets and results arriving after
    /// detach are ignored; returns whether the state changed.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Arc<[RiverLevel]>, ClientError>,
    ) -> bool {
        if self.detached || ticket.generation != self.generation || self.phase != LoadPhase::Loading
        {
            return false;
        }

        match result {
            Ok(levels) if levels.is_empty() => {
                self.levels = levels;
                self.phase = LoadPhase::Empty;
            }
            Ok(levels) => {
                self.levels = levels;
                self.phase = LoadPhase::Ready;
            }
            Err(e) => {
                self.levels = Arc::from(Vec::new());
                self.phase = LoadPhase::Error(e.to_string());
            }
        }
        self.load_completed = true;
        true
    }

    /// Replace the river metadata. A new gauge invalidates any in-flight
    /// load and returns `true` so the caller can start a fresh one.
    pub fn set_detail(&mut self, detail: RiverDetail) -> bool {
        let inputs_changed = detail.site_code != self.detail.site_code;
        self.detail = detail;
        if !inputs_changed {
            return false;
        }

        self.generation += 1;
        self.loaded_site = None;
        self.levels = Arc::from(Vec::new());
        self.phase = if self.detail.has_gauge() {
            LoadPhase::Idle
        } else {
            self.load_completed = true;
            LoadPhase::Empty
        };
        self.detail.has_gauge()
    }

    pub fn detach(&mut self) {
        self.detached = true;
    }
}
