//! The geost propagation engine.
//!
//! # Lifecycle
//!
//! 1. [`Geost::new`] validates the model, asks every external constraint
//!    for its generators and computes their initial geometry.
//! 2. The host reports every changed variable through
//!    [`Geost::on_variable_changed`] and calls [`Geost::consistency`] until
//!    the store stops changing.
//! 3. On backtracking the host calls [`Geost::on_remove_level`] before the
//!    store restores its domains and [`Geost::on_remove_level_late`] after.
//!
//! # Propagation
//!
//! Changed variables are absorbed first: grounding counters are updated,
//! `start + duration = end` is propagated, the generators reading the
//! owning object are refreshed and the object and its neighbours in the
//! interaction graph are queued. Queued objects are then pruned axis by axis
//! and shape by shape with the sweep; shapes without any feasible point are
//! removed from the shape selector, and the loosest bounds across the
//! surviving shapes are written back.

mod options;
mod stats;
mod sweep;
mod trail;


pub use options::GeostOptions;
pub use stats::GeostStats;
pub use sweep::SweepOutcome;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{GeostError, Inconsistency};
use crate::external::{ExternalConstraint, ModelView};
use crate::geometry::{BoxPool, DBox};
use crate::internal::{DomainHoles, Generator, InternalConstraint, SweepContext};
use crate::object::GeostObject;
use crate::order::DimensionOrder;
use crate::shape::{Shape, ShapeRegistry};
use crate::store::{Store, VarId};

use sweep::Sweep;
use trail::Trail;

/// Geometric placement constraint over a set of objects.
#[derive(Debug)]
pub struct Geost {
    dimension: usize,
    objects: Vec<GeostObject>,
    shapes: ShapeRegistry,
    externals: Vec<Box<dyn ExternalConstraint>>,
    generators: Vec<Generator>,
    /// Generators restricting each object, domain holes excluded.
    applicable: Vec<Vec<usize>>,
    /// Generators whose geometry is read from each object's domains.
    owned: Vec<Vec<usize>>,
    /// Domain-holes generator of each object.
    holes: Vec<usize>,
    /// Owning object of every defining variable, once per slot.
    var_owners: HashMap<VarId, Vec<usize>>,
    /// Variables already counted in the grounding counters.
    var_grounded: HashSet<VarId>,
    /// Objects linked when one reads the other's geometry; node `i` is
    /// object `i`.
    graph: UnGraph<i32, ()>,
    order: DimensionOrder,
    pool: BoxPool,
    options: GeostOptions,
    stats: GeostStats,
    pending_vars: Vec<VarId>,
    pending_set: HashSet<VarId>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    prune_if_grounded: Vec<bool>,
    trail: Trail,
    /// Objects to refresh once the store has restored a removed level.
    replay: Vec<usize>,
}

impl Geost {
    /// Builds the engine with default options.
    ///
    /// # Errors
    ///
    /// See [`Geost::with_options`].
    pub fn new(
        objects: Vec<GeostObject>,
        externals: Vec<Box<dyn ExternalConstraint>>,
        shapes: Vec<Shape>,
        store: &Store,
    ) -> Result<Self, GeostError> {
        Self::with_options(objects, externals, shapes, store, GeostOptions::default())
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// - `InvalidDimension` for zero-dimensional objects, axes beyond time
    ///   or a dimension order that is not a permutation
    /// - `DimensionMismatch` when objects, shapes or areas disagree on `k`
    /// - `NegativeObjectId` / `DuplicateObjectId` for bad object ids
    /// - `NegativeShapeId` / `DuplicateShapeId` for bad shape ids
    /// - `UnknownShape` when a shape selector allows an unregistered id
    /// - `UnknownObject` when an external constraint names an unknown object
    pub fn with_options(
        objects: Vec<GeostObject>,
        externals: Vec<Box<dyn ExternalConstraint>>,
        shapes: Vec<Shape>,
        store: &Store,
        options: GeostOptions,
    ) -> Result<Self, GeostError> {
        let shapes = ShapeRegistry::new(shapes)?;
        let dimension = match objects.first() {
            Some(o) => o.dimension(),
            None => shapes.dimension().unwrap_or(1),
        };
        if dimension == 0 {
            return Err(GeostError::InvalidDimension(0));
        }
        if let Some(d) = shapes.dimension().filter(|&d| d != dimension) {
            return Err(GeostError::DimensionMismatch {
                expected: dimension,
                found: d,
            });
        }
        let index = index_objects(&objects, dimension)?;
        for o in &objects {
            if let Some(shape) = store.dom(o.shape()).values().find(|&s| !shapes.contains(s)) {
                return Err(GeostError::UnknownShape {
                    object: o.id(),
                    shape,
                });
            }
        }
        let order = match &options.dimension_order {
            None => DimensionOrder::identity(dimension + 1),
            Some(master) if master.len() != dimension + 1 => {
                return Err(GeostError::DimensionMismatch {
                    expected: dimension + 1,
                    found: master.len(),
                })
            }
            Some(master) => DimensionOrder::new(master.clone())
                .ok_or(GeostError::InvalidDimension(dimension + 1))?,
        };

        let n = objects.len();
        let mut generators = Vec::new();
        let mut applicable = vec![Vec::new(); n];
        let mut owned = vec![Vec::new(); n];
        let mut graph = UnGraph::<i32, ()>::default();
        for o in &objects {
            graph.add_node(o.id());
        }
        {
            let model = ModelView {
                objects: &objects,
                index: &index,
                store,
                dimension,
            };
            for external in &externals {
                external.validate(&model)?;
                for generator in external.generate(&model) {
                    let g = generators.len();
                    for o in (0..n).filter(|&o| external.is_applicable(&generator, o, &model)) {
                        applicable[o].push(g);
                        if let Some(owner) = generator.owner() {
                            graph.update_edge(NodeIndex::new(owner), NodeIndex::new(o), ());
                        }
                    }
                    if let Some(owner) = generator.owner() {
                        owned[owner].push(g);
                    }
                    generators.push(generator);
                }
            }
        }
        let mut holes = Vec::with_capacity(n);
        for o in 0..n {
            holes.push(generators.len());
            generators.push(Generator::DomainHoles(DomainHoles::new(o, dimension)));
        }

        let ctx = SweepContext {
            store,
            shapes: &shapes,
            objects: &objects,
        };
        for generator in &mut generators {
            generator.refresh(&ctx);
        }

        let mut var_owners: HashMap<VarId, Vec<usize>> = HashMap::new();
        for (i, o) in objects.iter().enumerate() {
            for var in o.defining_vars() {
                var_owners.entry(var).or_default().push(i);
            }
        }
        // Everything is new to the engine: the first consistency call
        // absorbs every variable.
        let mut pending_vars: Vec<VarId> = Vec::new();
        let mut pending_set = HashSet::new();
        for o in &objects {
            for var in o.defining_vars() {
                if pending_set.insert(var) {
                    pending_vars.push(var);
                }
            }
        }

        log::debug!(
            "geost: {} objects, {} shapes, {} generators, {} constraints",
            n,
            shapes.len(),
            generators.len(),
            externals.len()
        );

        Ok(Self {
            dimension,
            objects,
            shapes,
            externals,
            generators,
            applicable,
            owned,
            holes,
            var_owners,
            var_grounded: HashSet::new(),
            graph,
            order,
            pool: BoxPool::new(),
            options,
            stats: GeostStats::default(),
            pending_vars,
            pending_set,
            queue: VecDeque::new(),
            queued: vec![false; n],
            prune_if_grounded: vec![false; n],
            trail: Trail::default(),
            replay: Vec::new(),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────

    /// Number of geometric axes `k`.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn objects(&self) -> &[GeostObject] {
        &self.objects
    }

    pub fn object(&self, id: i32) -> Option<&GeostObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn externals(&self) -> &[Box<dyn ExternalConstraint>] {
        &self.externals
    }

    pub fn options(&self) -> &GeostOptions {
        &self.options
    }

    pub fn stats(&self) -> &GeostStats {
        &self.stats
    }

    pub fn pool(&self) -> &BoxPool {
        &self.pool
    }

    /// Ids of the objects whose geometry is read by generators restricting
    /// the object `id`.
    pub fn neighbours(&self, id: i32) -> Vec<i32> {
        let Some(i) = self.objects.iter().position(|o| o.id() == id) else {
            return Vec::new();
        };
        let mut ids: Vec<i32> = self
            .graph
            .neighbors(NodeIndex::new(i))
            .map(|n| self.graph[n])
            .collect();
        ids.sort_unstable();
        ids
    }

    // ── Host hooks ────────────────────────────────────────────────────

    /// Records that `var` changed at `level`.
    pub fn on_variable_changed(&mut self, level: usize, var: VarId) {
        if self.var_owners.contains_key(&var) && self.pending_set.insert(var) {
            log::trace!("geost: {var} changed at level {level}");
            self.pending_vars.push(var);
        }
    }

    /// Runs propagation to a fixpoint of the engine.
    ///
    /// Returns immediately when nothing changed since the last call.
    pub fn consistency(&mut self, store: &mut Store) -> Result<(), Inconsistency> {
        self.stats.consistency_calls += 1;
        match self.propagate(store) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.stats.failures += 1;
                self.clear_queues();
                log::debug!("geost: failure at level {}: {e}", store.level());
                Err(e)
            }
        }
    }

    /// Undoes the bookkeeping of `level` and above. Must be called before
    /// the store restores its domains.
    pub fn on_remove_level(&mut self, level: usize) {
        let undo = self.trail.remove_from(level);
        for var in undo.grounded {
            if self.var_grounded.remove(&var) {
                if let Some(owners) = self.var_owners.get(&var) {
                    for &o in owners {
                        self.objects[o].ground_count -= 1;
                    }
                }
            }
        }
        self.replay = undo.objects;
        self.clear_queues();
        log::debug!(
            "geost: removed level {level}, {} objects to refresh",
            self.replay.len()
        );
    }

    /// Refreshes the generators of the objects updated at the removed
    /// levels, most recent first. Must be called after the store restored
    /// its domains and before the next consistency call.
    pub fn on_remove_level_late(&mut self, level: usize, store: &Store) {
        let replay = std::mem::take(&mut self.replay);
        for o in replay {
            if self.objects[o].is_grounded() {
                continue;
            }
            self.refresh_object(o, store);
        }
        log::trace!("geost: level {level} restored");
    }

    /// True when every defining variable of every object is fixed.
    pub fn satisfied(&self, store: &Store) -> bool {
        self.objects
            .iter()
            .all(|o| o.defining_vars().all(|v| store.is_singleton(v)))
    }

    // ── Propagation ───────────────────────────────────────────────────

    fn propagate(&mut self, store: &mut Store) -> Result<(), Inconsistency> {
        loop {
            self.absorb(store)?;
            let Some(o) = self.queue.pop_front() else {
                return Ok(());
            };
            self.queued[o] = false;
            if self.objects[o].is_grounded() && !self.prune_if_grounded[o] {
                continue;
            }
            self.prune_object(o, store)?;
        }
    }

    fn push_pending(&mut self, var: VarId) {
        if self.pending_set.insert(var) {
            self.pending_vars.push(var);
        }
    }

    fn enqueue(&mut self, o: usize) {
        if !self.queued[o] {
            self.queued[o] = true;
            self.queue.push_back(o);
        }
    }

    fn clear_queues(&mut self) {
        self.pending_vars.clear();
        self.pending_set.clear();
        self.queue.clear();
        self.queued.fill(false);
        self.prune_if_grounded.fill(false);
    }

    /// Routes pending variables to their objects until none is left.
    fn absorb(&mut self, store: &mut Store) -> Result<(), Inconsistency> {
        while !self.pending_vars.is_empty() {
            let vars = std::mem::take(&mut self.pending_vars);
            self.pending_set.clear();
            let level = store.level();
            let mut touched: Vec<usize> = Vec::new();
            for var in vars {
                let Some(owners) = self.var_owners.get(&var) else {
                    continue;
                };
                if store.is_singleton(var) && self.var_grounded.insert(var) {
                    for &o in owners {
                        self.objects[o].ground_count += 1;
                    }
                    self.trail.record_grounded(level, var);
                }
                for &o in owners {
                    if !touched.contains(&o) {
                        touched.push(o);
                    }
                }
            }
            for o in touched {
                let object = &self.objects[o];
                let time_vars = [object.start(), object.duration(), object.end()];
                if object
                    .time_constraint()
                    .consistency(store, self.options.max_time_iterations)?
                {
                    for var in time_vars {
                        self.push_pending(var);
                    }
                }
                self.refresh_object(o, store);
                self.trail.record_update(level, o);
                self.prune_if_grounded[o] = true;
                self.enqueue(o);
                let neighbours: Vec<usize> = self
                    .graph
                    .neighbors(NodeIndex::new(o))
                    .map(NodeIndex::index)
                    .collect();
                for n in neighbours {
                    self.enqueue(n);
                }
            }
        }
        Ok(())
    }

    fn refresh_object(&mut self, o: usize, store: &Store) {
        let ctx = SweepContext {
            store,
            shapes: &self.shapes,
            objects: &self.objects,
        };
        for &g in &self.owned[o] {
            self.generators[g].refresh(&ctx);
            self.stats.frame_refreshes += 1;
        }
    }

    fn prune_object(&mut self, o: usize, store: &mut Store) -> Result<(), Inconsistency> {
        self.stats.objects_pruned += 1;
        self.prune_if_grounded[o] = false;
        let occupancy = self.objects[o].occupancy_box(store, &self.shapes);
        let mut active: Vec<usize> = self.applicable[o]
            .iter()
            .copied()
            .filter(|&g| {
                let generator = &self.generators[g];
                generator.card_infeasible() > 0
                    && (!self.options.filter_generators
                        || generator.abs_region_intersects(&occupancy))
            })
            .collect();
        active.sort_by_key(|&g| std::cmp::Reverse(self.generators[g].card_infeasible()));
        log::trace!(
            "geost: pruning object {} with {} of {} generators",
            self.objects[o].id(),
            active.len(),
            self.applicable[o].len()
        );

        let mut caches: HashMap<i32, Vec<DBox>> = HashMap::new();
        let result = (0..=self.dimension)
            .try_for_each(|axis| self.prune_axis(o, axis, store, &active, &mut caches));
        for (_, mut boxes) in caches {
            self.pool.release_all(&mut boxes);
        }
        result
    }

    fn prune_axis(
        &mut self,
        o: usize,
        axis: usize,
        store: &mut Store,
        active: &[usize],
        caches: &mut HashMap<i32, Vec<DBox>>,
    ) -> Result<(), Inconsistency> {
        self.order.set_most_significant(axis);
        let mut candidates = self.objects[o].possible_shapes(store);
        if let Some(best) = self.objects[o].best_shape_per_dimension[axis] {
            if let Some(pos) = candidates.iter().position(|&s| s == best) {
                candidates[..=pos].rotate_right(1);
            }
        }
        let limit_allowed = self.options.use_limit && axis > 0;
        let mut lower: Option<i32> = None;
        let mut upper: Option<i32> = None;
        let mut best_shape = None;
        let mut infeasible = Vec::new();

        for &s in &candidates {
            let Some(shape) = self.shapes.get(s) else {
                infeasible.push(s);
                continue;
            };
            let mut sweep = Sweep {
                object: &self.objects[o],
                shape,
                ctx: SweepContext {
                    store: &*store,
                    shapes: &self.shapes,
                    objects: &self.objects,
                },
                holes: &self.generators[self.holes[o]],
                generators: &self.generators,
                active,
                order: &self.order,
                pool: &mut self.pool,
                cache: caches.entry(s).or_default(),
                stats: &mut self.stats,
                cache_static: self.options.cache_static_boxes,
            };
            let min = match sweep.prune_min(axis, lower.filter(|_| limit_allowed)) {
                SweepOutcome::Infeasible => {
                    infeasible.push(s);
                    continue;
                }
                SweepOutcome::Limited => None,
                SweepOutcome::Feasible(v) => Some(v),
            };
            let max = match sweep.prune_max(axis, upper.filter(|_| limit_allowed)) {
                SweepOutcome::Infeasible => {
                    infeasible.push(s);
                    continue;
                }
                SweepOutcome::Limited => None,
                SweepOutcome::Feasible(v) => Some(v),
            };
            if let Some(v) = min {
                if lower.map_or(true, |l| v < l) {
                    lower = Some(v);
                    best_shape = Some(s);
                }
            }
            if let Some(v) = max {
                if upper.map_or(true, |u| v > u) {
                    upper = Some(v);
                }
            }
        }

        let object_id = self.objects[o].id();
        let (Some(lower), Some(upper)) = (lower, upper) else {
            log::debug!("geost: object {object_id} has no feasible shape on axis {axis}");
            return Err(Inconsistency::NoFeasibleShape {
                object: object_id,
                axis,
            });
        };
        if !infeasible.is_empty() {
            let shape_var = self.objects[o].shape();
            for s in infeasible {
                if store.remove_value(shape_var, s)? {
                    self.stats.shapes_eliminated += 1;
                    log::debug!("geost: object {object_id} loses shape {s} on axis {axis}");
                }
            }
            self.push_pending(shape_var);
            self.prune_if_grounded.fill(true);
        }
        self.objects[o].best_shape_per_dimension[axis] = best_shape;

        let var = self.objects[o].sweep_var(axis);
        if store.in_interval(var, lower, upper)? {
            self.stats.bound_updates += 1;
            self.push_pending(var);
            log::debug!(
                "geost: object {object_id} axis {axis} narrowed to [{}, {}]",
                store.min(var),
                store.max(var)
            );
        }
        Ok(())
    }
}

impl Display for Geost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Geost({} objects, {} shapes, k = {})",
            self.objects.len(),
            self.shapes.len(),
            self.dimension
        )?;
        for external in &self.externals {
            writeln!(f, "  {}", external.stringify())?;
        }
        Ok(())
    }
}

/// Checks object arity and ids, and indexes objects by id.
fn index_objects(objects: &[GeostObject], dimension: usize) -> Result<HashMap<i32, usize>, GeostError> {
    let mut index = HashMap::with_capacity(objects.len());
    for (i, o) in objects.iter().enumerate() {
        if o.dimension() != dimension {
            return Err(GeostError::DimensionMismatch {
                expected: dimension,
                found: o.dimension(),
            });
        }
        if o.id() < 0 {
            return Err(GeostError::NegativeObjectId(o.id()));
        }
        if index.insert(o.id(), i).is_some() {
            return Err(GeostError::DuplicateObjectId(o.id()));
        }
    }
    Ok(index)
}
