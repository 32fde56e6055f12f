//! Applicable price list resolution.
//!
//! An actor may reach several price lists through different channels. The
//! channels are tried in a fixed priority order and the first one yielding an
//! active list wins; lists from different channels are never merged.
//!
//! ```text
//! workspace list ─▶ N:N assignment ─▶ legacy assignee ─▶ global list
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;

use crate::actors::Actor;
use crate::errors::Result;
use crate::price_lists::{PriceList, PriceListRepositoryTrait};

/// One channel through which an actor reaches price lists.
pub trait PriceListSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidate lists in preference order. Status, validity and courier are
    /// filtered by the resolver.
    fn candidates(&self, actor: &Actor) -> Result<Vec<PriceList>>;
}

pub struct WorkspaceListSource {
    repository: Arc<dyn PriceListRepositoryTrait>,
}

impl WorkspaceListSource {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl PriceListSource for WorkspaceListSource {
    fn name(&self) -> &'static str {
        "workspace"
    }

    fn candidates(&self, actor: &Actor) -> Result<Vec<PriceList>> {
        match &actor.workspace_price_list_id {
            Some(id) => Ok(self.repository.get_by_id(id)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }
}

pub struct AssignmentListSource {
    repository: Arc<dyn PriceListRepositoryTrait>,
}

impl AssignmentListSource {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl PriceListSource for AssignmentListSource {
    fn name(&self) -> &'static str {
        "assignment"
    }

    fn candidates(&self, actor: &Actor) -> Result<Vec<PriceList>> {
        self.repository.list_assigned(&actor.id)
    }
}

pub struct LegacyAssigneeSource {
    repository: Arc<dyn PriceListRepositoryTrait>,
}

impl LegacyAssigneeSource {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl PriceListSource for LegacyAssigneeSource {
    fn name(&self) -> &'static str {
        "legacy_assignee"
    }

    fn candidates(&self, actor: &Actor) -> Result<Vec<PriceList>> {
        self.repository.list_legacy_assigned(&actor.id)
    }
}

pub struct GlobalListSource {
    repository: Arc<dyn PriceListRepositoryTrait>,
}

impl GlobalListSource {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl PriceListSource for GlobalListSource {
    fn name(&self) -> &'static str {
        "global"
    }

    fn candidates(&self, _actor: &Actor) -> Result<Vec<PriceList>> {
        let mut lists = self.repository.list_global()?;
        lists.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(lists)
    }
}

/// A resolved list together with the channel that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPriceList {
    pub price_list: PriceList,
    pub source: &'static str,
}

pub struct ApplicableListResolver {
    sources: Vec<Box<dyn PriceListSource>>,
}

impl ApplicableListResolver {
    pub fn new(sources: Vec<Box<dyn PriceListSource>>) -> Self {
        Self { sources }
    }

    /// Workspace, assignment, legacy assignee, global.
    pub fn standard(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self::new(vec![
            Box::new(WorkspaceListSource::new(repository.clone())),
            Box::new(AssignmentListSource::new(repository.clone())),
            Box::new(LegacyAssigneeSource::new(repository.clone())),
            Box::new(GlobalListSource::new(repository)),
        ])
    }

    pub fn resolve(
        &self,
        actor: &Actor,
        courier_id: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<ResolvedPriceList>> {
        self.resolve_where(actor, courier_id, today, |_| true)
    }

    /// Same cascade, ignoring candidates rejected by `accept`.
    pub fn resolve_where<F>(
        &self,
        actor: &Actor,
        courier_id: Option<&str>,
        today: NaiveDate,
        accept: F,
    ) -> Result<Option<ResolvedPriceList>>
    where
        F: Fn(&PriceList) -> bool,
    {
        for source in &self.sources {
            let mut candidates = source.candidates(actor)?;
            candidates.retain(|l| accept(l));
            if let Some(list) = pick_candidate(candidates, courier_id, today) {
                debug!(
                    "Resolved price list {} for {} via {}",
                    list.id,
                    actor.id,
                    source.name()
                );
                return Ok(Some(ResolvedPriceList {
                    price_list: list,
                    source: source.name(),
                }));
            }
        }
        debug!("No applicable price list for {}", actor.id);
        Ok(None)
    }
}

/// First usable candidate, preferring one dedicated to the requested courier.
fn pick_candidate(
    candidates: Vec<PriceList>,
    courier_id: Option<&str>,
    today: NaiveDate,
) -> Option<PriceList> {
    let mut usable = candidates
        .into_iter()
        .filter(|l| l.is_active_on(today) && l.serves_courier(courier_id));

    let first = usable.next()?;
    if courier_id.is_none() || first.courier_id.is_some() {
        return Some(first);
    }
    usable
        .find(|l| l.courier_id.is_some())
        .or(Some(first))
}
