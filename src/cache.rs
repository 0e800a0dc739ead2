//! Range cache controller.
//!
//! Gates every paint on "are the rows on screen already in the row store".
//! When they are not, one fetch is started and the paint is withheld until
//! it resolves. At most one fetch is in flight; paints arriving meanwhile are
//! skipped rather than starting a second fetch. A fetch whose range no longer
//! covers the viewport when it resolves is discarded without committing.
//!
//! Every load of a new result set starts a new epoch ([`RangeCache::reset`]).
//! Fetches that resolve in an older epoch are discarded as well.

use std::cell::RefCell;

use crate::error::Result;
use crate::range::{RangeRequest, VisibleRange};

/// Fetching state of a [`RangeCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    Idle,
    Fetching(VisibleRange),
}

/// Outcome of gating a paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Visible rows are cached; paint now.
    Render,
    /// A fetch is in flight; skip this paint.
    Skip,
    /// Fetch the ticket's range, then settle it.
    Fetch(FetchTicket),
}

/// A fetch started by [`RangeCache::gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub range: VisibleRange,
    epoch: u64,
}

/// Source of row ranges for [`RangeCache::ensure_range_loaded`].
#[allow(async_fn_in_trait)]
pub trait RangeLoader {
    type Page;

    /// Fetch the rows of `range`. Must not touch the row store.
    async fn fetch(&self, range: VisibleRange) -> Result<Self::Page>;

    /// Rows visible right now, re-estimated from the current viewport.
    fn current_visible(&self) -> Option<VisibleRange>;

    /// Write a fetched page into the row store.
    fn commit(&self, range: VisibleRange, page: Self::Page) -> Result<()>;
}

#[derive(Debug, Default)]
struct CacheState {
    cached: Option<VisibleRange>,
    in_flight: Option<VisibleRange>,
    epoch: u64,
}

/// Per-grid cache state: the committed range and the fetch in flight.
#[derive(Debug, Default)]
pub struct RangeCache {
    state: RefCell<CacheState>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows known to be present in the row store.
    pub fn cached_range(&self) -> Option<VisibleRange> {
        self.state.borrow().cached
    }

    pub fn in_flight_range(&self) -> Option<VisibleRange> {
        self.state.borrow().in_flight
    }

    pub fn phase(&self) -> CachePhase {
        match self.state.borrow().in_flight {
            Some(range) => CachePhase::Fetching(range),
            None => CachePhase::Idle,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// Start a new epoch with `cached` as the only known range.
    ///
    /// A fetch still in flight from the previous epoch will be discarded.
    pub fn reset(&self, cached: Option<VisibleRange>) {
        let mut s = self.state.borrow_mut();
        s.epoch = s.epoch.wrapping_add(1);
        s.in_flight = None;
        s.cached = cached;
    }

    /// Decide what a paint needing `request` should do.
    ///
    /// `None` means there is nothing to load (an empty result set).
    pub fn gate(&self, request: Option<RangeRequest>) -> Gate {
        let Some(request) = request else {
            return Gate::Render;
        };
        let mut s = self.state.borrow_mut();
        if let Some(in_flight) = s.in_flight {
            if !request.visible.within(&in_flight) {
                log::debug!(
                    "viewport {} left in-flight range {in_flight}; waiting for it to resolve",
                    request.visible
                );
            }
            return Gate::Skip;
        }
        if request.visible.within_opt(s.cached.as_ref()) {
            return Gate::Render;
        }
        log::debug!("fetching rows {} for viewport {}", request.fetch, request.visible);
        s.in_flight = Some(request.fetch);
        Gate::Fetch(FetchTicket {
            range: request.fetch,
            epoch: s.epoch,
        })
    }

    /// End the fetch for `ticket`. Returns whether its rows should be committed.
    ///
    /// They should when the ticket belongs to the current epoch and the rows
    /// visible now (`current`) still lie within the fetched range.
    pub fn settle(&self, ticket: &FetchTicket, current: Option<VisibleRange>) -> bool {
        let mut s = self.state.borrow_mut();
        if ticket.epoch != s.epoch {
            log::debug!("discarding rows {} from a previous load", ticket.range);
            return false;
        }
        s.in_flight = None;
        let relevant = current.map_or(true, |visible| visible.within(&ticket.range));
        if !relevant {
            log::debug!("discarding rows {}: viewport moved", ticket.range);
        }
        relevant
    }

    /// Record that the rows of `ticket` were committed to the row store.
    pub fn mark_cached(&self, ticket: &FetchTicket) {
        let mut s = self.state.borrow_mut();
        if ticket.epoch == s.epoch {
            s.cached = Some(ticket.range);
        }
    }

    /// Abandon the fetch for `ticket`, leaving the cached range unchanged.
    pub fn abort(&self, ticket: &FetchTicket) {
        let mut s = self.state.borrow_mut();
        if ticket.epoch == s.epoch && s.in_flight == Some(ticket.range) {
            s.in_flight = None;
        }
    }

    /// Make sure the rows of `request` are loaded. Returns whether to paint now.
    ///
    /// Errors from `loader` are returned to the caller after the in-flight
    /// fetch is cleared; the cached range is unchanged, so the next paint
    /// retries the same range.
    pub async fn ensure_range_loaded<L: RangeLoader>(
        &self,
        request: Option<RangeRequest>,
        loader: &L,
    ) -> Result<bool> {
        let ticket = match self.gate(request) {
            Gate::Render => return Ok(true),
            Gate::Skip => return Ok(false),
            Gate::Fetch(ticket) => ticket,
        };

        let page = match loader.fetch(ticket.range).await {
            Ok(page) => page,
            Err(e) => {
                self.abort(&ticket);
                return Err(e);
            }
        };

        if !self.settle(&ticket, loader.current_visible()) {
            return Ok(false);
        }
        loader.commit(ticket.range, page)?;
        self.mark_cached(&ticket);
        log::debug!("committed rows {}", ticket.range);
        Ok(true)
    }
}
