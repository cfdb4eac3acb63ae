//! Follows panorama links along a route.
//!
//! The walker is a small state machine:
//!
//! * `Searching { from }` probes route point `from` for any nearby
//!   panorama and moves on to `from + 1` when there is none.
//! * `Linked` follows one link of the last accepted panorama, the one
//!   pointing closest to the route's heading (or the configured
//!   override).
//! * `Terminated` ends the walk.
//!
//! Each [`Walker::step`] performs at most one fetch, and an accepted
//! panorama is saved to the [`ChainStore`] before `step` returns. All
//! state lives in a [`Traversal`], which can be rebuilt from the saved
//! panoramas to resume a walk.

use crate::{
    chain::{Chain, ChainRules, ChainStore},
    config::{RejectPolicy, WalkConfig},
    math::circular_diff,
    math::geodesic,
    pano::{Link, PanoMeta, Panorama},
    route::Route,
    source::PanoSource,
    ChainError,
};
use log::{debug, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Walker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Probing raw route points, starting at `from`.
    Searching { from: usize },

    /// Following a link of the last panorama in the chain.
    Linked,

    Terminated,
}

/// Why a candidate was not followed or not accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The best link pointed too far away from the route heading.
    Yaw { link_yaw: f64, heading: f64, diff: f64 },

    /// The panorama has no links at all.
    NoLinks,

    /// The link target does not exist.
    MissingTarget { pano_id: String },

    /// The panorama is too far from the route.
    Offset { pano_id: String, distance_m: f64 },
}

/// Everything a walk needs to carry from one step to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    chain: Chain,

    /// Lower bound for route lookups; never decreases.
    cursor: usize,
    state: WalkState,
}

impl Traversal {
    /// Returns a traversal that starts at the beginning of the route.
    pub fn new() -> Self {
        Self {
            chain: Chain::new(),
            cursor: 0,
            state: WalkState::Searching { from: 0 },
        }
    }

    /// Rebuilds the traversal a previous walk over `route` ended with.
    ///
    /// The last panorama must sit where it says it does on `route`,
    /// otherwise the route changed since the panoramas were saved.
    pub fn resume(
        panoramas: Vec<Panorama>,
        route: &Route,
        max_offset_m: f64,
    ) -> Result<Self, ChainError> {
        let chain = Chain::from_panoramas(panoramas)?;
        let Some(last) = chain.last() else {
            return Ok(Self::new());
        };
        let resume_err = |reason: String| ChainError::Resume {
            pano_id: last.id.clone(),
            route_index: last.route_index,
            reason,
        };
        let point = route.get(last.route_index).ok_or_else(|| {
            resume_err(format!("route only has {} points", route.len()))
        })?;
        let offset_m = geodesic::distance(point.coord(), last.coord());
        if offset_m > max_offset_m {
            return Err(resume_err(format!(
                "it is {offset_m:.1}m from that route point"
            )));
        }
        let cursor = last.route_index;
        Ok(Self {
            chain,
            cursor,
            state: WalkState::Linked,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn into_chain(self) -> Chain {
        self.chain
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == WalkState::Terminated
    }
}

impl Default for Traversal {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative cancellation, checked between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Reached the end of the route.
    Completed,

    /// Stopped early by a [`CancelToken`] or a step limit. The
    /// traversal can be continued.
    Paused,
}

/// Returns the link pointing closest to `heading`, and how far off it
/// is.
pub fn select_link(links: &[Link], heading: f64) -> Option<(&Link, f64)> {
    links
        .iter()
        .map(|link| (link, circular_diff(link.yaw, heading)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
}

/// Where a candidate panorama came from.
#[derive(Debug, Clone, Copy)]
enum Origin {
    /// Probe of the given route point.
    Probe(usize),
    /// Link (or override) of the last panorama.
    Link,
}

pub struct Walker<'a, P, S> {
    route: &'a Route,
    source: P,
    store: S,
    rules: ChainRules,
    config: WalkConfig,
    cancel: CancelToken,
}

impl<'a, P, S> Walker<'a, P, S>
where
    P: PanoSource,
    S: ChainStore,
{
    pub fn builder() -> WalkerBuilder<'a, P, S> {
        WalkerBuilder {
            route: None,
            source: None,
            store: None,
            rules: ChainRules::default(),
            config: WalkConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Loads whatever the store holds and returns the matching
    /// traversal.
    pub fn load(&self) -> Result<Traversal, ChainError> {
        let panoramas = self.store.load()?;
        Traversal::resume(panoramas, self.route, self.config.max_offset_m)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Loads the stored chain and walks until the route ends or the
    /// walk is cancelled.
    pub fn run(&mut self) -> Result<(Traversal, WalkOutcome), ChainError> {
        let mut traversal = self.load()?;
        let outcome = self.walk(&mut traversal, None)?;
        Ok((traversal, outcome))
    }

    /// Steps `traversal` until it terminates, the cancel token fires
    /// or `max_steps` steps were taken.
    ///
    /// The chain is saved once more on the way out, whether or not the
    /// walk failed.
    pub fn walk(
        &mut self,
        traversal: &mut Traversal,
        max_steps: Option<usize>,
    ) -> Result<WalkOutcome, ChainError> {
        let result = self.walk_inner(traversal, max_steps);
        let saved = self.store.save(traversal.chain.panoramas());
        match (result, saved) {
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
            (Ok(outcome), Ok(())) => {
                info!(
                    "walk {outcome:?} with {} panoramas, cursor {}",
                    traversal.chain.len(),
                    traversal.cursor
                );
                Ok(outcome)
            }
        }
    }

    fn walk_inner(
        &mut self,
        traversal: &mut Traversal,
        max_steps: Option<usize>,
    ) -> Result<WalkOutcome, ChainError> {
        let mut steps = 0;
        while !traversal.is_terminated() {
            if self.cancel.is_cancelled() || max_steps.is_some_and(|max| steps >= max) {
                return Ok(WalkOutcome::Paused);
            }
            self.step(traversal)?;
            steps += 1;
        }
        Ok(WalkOutcome::Completed)
    }

    /// Performs one transition, fetching at most one panorama.
    pub fn step(&mut self, traversal: &mut Traversal) -> Result<WalkState, ChainError> {
        traversal.state = match traversal.state {
            WalkState::Terminated => WalkState::Terminated,
            WalkState::Searching { from } => self.probe(traversal, from)?,
            WalkState::Linked => self.follow(traversal)?,
        };
        Ok(traversal.state)
    }

    fn probe(&mut self, traversal: &mut Traversal, from: usize) -> Result<WalkState, ChainError> {
        let Some(point) = self.route.get(from) else {
            debug!("probed to the end of the route");
            return Ok(WalkState::Terminated);
        };
        debug!("probe ({},{}) {}", point.lat, point.lng, point.index);
        match self.source.near(point.coord(), self.config.probe_radius_m)? {
            Some(meta) => self.consider(traversal, meta, Origin::Probe(from)),
            None => Ok(WalkState::Searching { from: from + 1 }),
        }
    }

    fn follow(&mut self, traversal: &mut Traversal) -> Result<WalkState, ChainError> {
        let Some(current) = traversal.chain.last() else {
            return Ok(WalkState::Searching {
                from: traversal.cursor,
            });
        };

        let target_id = if let Some(forced) = self.rules.overrides.get(&current.id) {
            debug!("override {} -> {forced}", current.id);
            forced.clone()
        } else {
            let Some(heading) = self.route.forward_bearing(traversal.cursor) else {
                debug!("no route left after {}", current.id);
                return Ok(WalkState::Terminated);
            };
            match select_link(&current.links, heading) {
                None => return Ok(self.rejected(traversal, Rejection::NoLinks)),
                Some((link, diff)) if diff > self.config.max_yaw_diff_deg => {
                    let rejection = Rejection::Yaw {
                        link_yaw: link.yaw,
                        heading,
                        diff,
                    };
                    return Ok(self.rejected(traversal, rejection));
                }
                Some((link, _)) => link.pano_id.clone(),
            }
        };

        match self.source.by_id(&target_id)? {
            Some(meta) => self.consider(traversal, meta, Origin::Link),
            None => Ok(self.rejected(
                traversal,
                Rejection::MissingTarget { pano_id: target_id },
            )),
        }
    }

    fn rejected(&self, traversal: &Traversal, rejection: Rejection) -> WalkState {
        debug!("rejected at {}: {rejection:?}", traversal.cursor);
        match self.config.on_reject {
            RejectPolicy::Reset => WalkState::Searching {
                from: traversal.cursor,
            },
            RejectPolicy::Terminate => WalkState::Terminated,
        }
    }

    fn consider(
        &mut self,
        traversal: &mut Traversal,
        meta: PanoMeta,
        origin: Origin,
    ) -> Result<WalkState, ChainError> {
        // Where to pick up probing if this candidate goes nowhere.
        let resume_from = |cursor: usize| match origin {
            Origin::Probe(at) => WalkState::Searching {
                from: (at + 1).max(cursor),
            },
            Origin::Link => WalkState::Searching { from: cursor },
        };

        if traversal.chain.contains(&meta.id) {
            debug!("already have {}, moving past {}", meta.id, traversal.cursor);
            traversal.cursor = (traversal.cursor + 1).min(self.route.last_index());
            return Ok(resume_from(traversal.cursor));
        }

        let Some((distance_m, point)) =
            self.route
                .nearest((meta.lat, meta.lng), traversal.cursor, self.config.proximity_m)
        else {
            return Ok(WalkState::Terminated);
        };
        if distance_m > self.config.max_offset_m {
            debug!(
                "rejected: {:?}",
                Rejection::Offset {
                    pano_id: meta.id,
                    distance_m
                }
            );
            return Ok(resume_from(traversal.cursor));
        }

        let pano = Panorama::new(meta, point.index);
        info!(
            "{} ({},{}) {}",
            pano.description, pano.lat, pano.lng, pano.route_index
        );
        traversal.cursor = pano.route_index;
        traversal.chain.push(pano);
        self.store.save(traversal.chain.panoramas())?;
        Ok(WalkState::Linked)
    }
}

pub struct WalkerBuilder<'a, P, S> {
    route: Option<&'a Route>,
    source: Option<P>,
    store: Option<S>,
    rules: ChainRules,
    config: WalkConfig,
    cancel: CancelToken,
}

impl<'a, P, S> WalkerBuilder<'a, P, S>
where
    P: PanoSource,
    S: ChainStore,
{
    /// Dense route to follow (required).
    #[must_use]
    pub fn route(mut self, route: &'a Route) -> Self {
        self.route = Some(route);
        self
    }

    /// Panorama metadata service (required).
    #[must_use]
    pub fn source(mut self, source: P) -> Self {
        self.source = Some(source);
        self
    }

    /// Where accepted panoramas are saved (required).
    #[must_use]
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides and exclusions (defaults to none).
    #[must_use]
    pub fn rules(mut self, rules: ChainRules) -> Self {
        self.rules = rules;
        self
    }

    /// Thresholds (defaults to [`WalkConfig::default`]).
    #[must_use]
    pub fn config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    /// Token checked between steps (defaults to a fresh token).
    #[must_use]
    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> Result<Walker<'a, P, S>, ChainError> {
        let route = self.route.ok_or(ChainError::Builder("route"))?;
        let source = self.source.ok_or(ChainError::Builder("source"))?;
        let store = self.store.ok_or(ChainError::Builder("store"))?;
        self.config.validate()?;
        Ok(Walker {
            route,
            source,
            store,
            rules: self.rules,
            config: self.config,
            cancel: self.cancel,
        })
    }
}
