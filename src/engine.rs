//! The accretion engine: the greedy growth loop that plants seeds and
//! grows their bodies cell by cell.
//!
//! Each round:
//! 1. Score every undecided frontier neighbor of every seed by the
//!    combined change in data misfit plus the weighted compactness
//!    penalty.
//! 2. Pick the single best `(cell, seed)` pair across all seeds; ties
//!    go to the lower seed index, then the lower flat cell index.
//! 3. Accept it only if it improves the goal function by more than
//!    `delta`; commit the cell to the seed's body and to every data
//!    module.
//!
//! The loop is greedy and non-backtracking: a committed accretion is
//! never undone. Scoring inside a round is read-only and runs in
//! parallel; the commit is strictly serialized.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::GrowthConfig;
use crate::data::DataModule;
use crate::error::ConfigError;
use crate::mesh::PrismMesh;
use crate::regularizer::Compactness;
use crate::seed::{PhysicalProps, Seed};
use crate::types::{CellId, SeedId};

/// How the growth loop ended. All variants are normal completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A full pass found no candidate improving the goal by more than
    /// `delta`.
    Converged,
    /// No seed has any undecided neighbor left.
    Exhausted,
    /// The external stop signal was raised; the estimate is the best
    /// one so far and all invariants hold.
    Stopped,
}

/// The global property mapping over the mesh: the union of all seed
/// bodies. Cells never accreted keep the background (unset) value.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    cells: Vec<Option<PhysicalProps>>,
}

impl Estimate {
    fn new(len: usize) -> Self {
        Self {
            cells: vec![None; len],
        }
    }

    fn set(&mut self, index: CellId, props: PhysicalProps) {
        debug_assert!(self.cells[index].is_none(), "cell accreted twice");
        self.cells[index] = Some(props);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: CellId) -> Option<&PhysicalProps> {
        self.cells.get(index).and_then(|c| c.as_ref())
    }

    /// Cells with assigned properties, in ascending cell order.
    pub fn assigned(&self) -> impl Iterator<Item = (CellId, &PhysicalProps)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|p| (i, p)))
    }

    pub fn assigned_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Per-cell density contrast with zero background. Magnetization
    /// cells contribute zero here.
    pub fn density(&self) -> Vec<f64> {
        self.cells
            .iter()
            .map(|c| match c {
                Some(PhysicalProps::Density(d)) => *d,
                _ => 0.0,
            })
            .collect()
    }
}

/// Result of a growth run.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub estimate: Estimate,
    /// Goal function value after seeding and after each accretion.
    pub goals: Vec<f64>,
    /// Data misfit part of the goal, on the same timeline.
    pub misfits: Vec<f64>,
    pub termination: Termination,
}

impl Harvest {
    /// Final value of the combined goal function.
    pub fn final_goal(&self) -> f64 {
        *self.goals.last().expect("timeline has the seeding entry")
    }

    pub fn final_misfit(&self) -> f64 {
        *self.misfits.last().expect("timeline has the seeding entry")
    }
}

/// Grows the seeds until convergence or mesh exhaustion.
///
/// Seeds must come from [`crate::seed::sow`] against the same mesh;
/// data modules keep their predicted vectors, which after the run hold
/// the forward-modeled data of the estimate.
///
/// ### Parameters
/// - `mesh` - The model space mesh.
/// - `seeds` - Growth origins; their bodies are mutated in place.
/// - `modules` - Data modules; their predicted data is mutated in place.
/// - `cfg` - Regularization and acceptance threshold.
///
/// ### Returns
/// The [`Harvest`] with the estimate, goal/misfit timelines, and the
/// termination state, or [`ConfigError`] if validation fails before
/// anything is mutated.
pub fn harvest(
    mesh: &PrismMesh,
    seeds: &mut [Seed],
    modules: &mut [DataModule],
    cfg: &GrowthConfig,
) -> Result<Harvest, ConfigError> {
    harvest_inner(mesh, seeds, modules, cfg, None)
}

/// Same as [`harvest`], but checks `stop` once per round and returns
/// early with [`Termination::Stopped`] when it is raised.
pub fn harvest_with_stop(
    mesh: &PrismMesh,
    seeds: &mut [Seed],
    modules: &mut [DataModule],
    cfg: &GrowthConfig,
    stop: &AtomicBool,
) -> Result<Harvest, ConfigError> {
    harvest_inner(mesh, seeds, modules, cfg, Some(stop))
}

fn harvest_inner(
    mesh: &PrismMesh,
    seeds: &mut [Seed],
    modules: &mut [DataModule],
    cfg: &GrowthConfig,
    stop: Option<&AtomicBool>,
) -> Result<Harvest, ConfigError> {
    cfg.validate()?;
    validate_seeds(mesh, seeds)?;
    info!(
        seeds = seeds.len(),
        modules = modules.len(),
        regul = cfg.regul,
        delta = cfg.delta,
        "growing anomalous bodies"
    );

    let reg = Compactness::new(mesh, cfg.power);
    let mut estimate = Estimate::new(mesh.len());
    let mut decided = vec![false; mesh.len()];

    // Plant the seeds: they are part of the estimate from the start.
    for seed in seeds.iter() {
        decided[seed.cell()] = true;
        estimate.set(seed.cell(), *seed.props());
        let prism = mesh
            .cell(seed.cell())
            .expect("validated seed cell is in bounds");
        for module in modules.iter_mut() {
            module.commit(&prism, seed.props());
        }
    }

    // Frontiers hold the undecided neighbors of each body. A cell may
    // sit on several frontiers; the first accretion wins it.
    let mut frontiers: Vec<Vec<CellId>> = seeds
        .iter()
        .map(|s| {
            mesh.neighbors(s.cell())
                .into_iter()
                .filter(|&n| !decided[n])
                .collect()
        })
        .collect();

    let mut misfit: f64 = modules.iter().map(|m| m.misfit()).sum();
    let mut reg_total = 0.0;
    let mut goals = vec![misfit];
    let mut misfits = vec![misfit];

    let termination = loop {
        if stop.is_some_and(|s| s.load(Ordering::Relaxed)) {
            break Termination::Stopped;
        }

        let candidates: Vec<(SeedId, CellId)> = frontiers
            .iter()
            .enumerate()
            .flat_map(|(s, f)| f.iter().map(move |&c| (s, c)))
            .collect();
        if candidates.is_empty() {
            break Termination::Exhausted;
        }

        // Read-only scoring; the chosen minimum is deterministic
        // because the comparator is a total order.
        let module_view: &[DataModule] = modules;
        let seed_view: &[Seed] = seeds;
        let (score, dmisfit, contributions, s, c) = candidates
            .par_iter()
            .map(|&(s, c)| {
                let (score, dmisfit, contributions) =
                    score_candidate(mesh, module_view, &seed_view[s], &reg, cfg, c);
                (score, dmisfit, contributions, s, c)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.3.cmp(&b.3)).then(a.4.cmp(&b.4)))
            .expect("candidate list is non-empty");

        if !(score < -cfg.delta) {
            break Termination::Converged;
        }

        // Commit the accretion, reusing the contributions computed
        // while scoring the winner.
        let prism = mesh.cell(c).expect("frontier cells are in bounds");
        let center = prism.center();
        decided[c] = true;
        estimate.set(c, *seeds[s].props());
        for (module, contribution) in modules.iter_mut().zip(&contributions) {
            module.commit_contribution(contribution);
        }
        // Compactness gain against the pre-accretion centroid, as
        // scored.
        reg_total += cfg.regul * reg.gain(center, seeds[s].centroid());
        seeds[s].accrete(c, center);
        misfit += dmisfit;
        goals.push(misfit + reg_total);
        misfits.push(misfit);
        debug!(cell = c, seed = s, goal = misfit + reg_total, "accretion");

        // The cell is decided for every seed.
        for frontier in frontiers.iter_mut() {
            frontier.retain(|&n| n != c);
        }
        for n in mesh.neighbors(c) {
            if !decided[n] && !frontiers[s].contains(&n) {
                frontiers[s].push(n);
            }
        }
    };

    info!(
        accretions = goals.len() - 1,
        goal = *goals.last().expect("timeline is non-empty"),
        ?termination,
        "growth finished"
    );
    Ok(Harvest {
        estimate,
        goals,
        misfits,
        termination,
    })
}

/// Combined score of accreting cell `c` to `seed`, the data-misfit
/// part alone, and the per-module contributions behind it (kept so an
/// accepted candidate can be committed without a second kernel sweep).
/// Degenerate kernel evaluations score `+inf` and are never accepted.
fn score_candidate(
    mesh: &PrismMesh,
    modules: &[DataModule],
    seed: &Seed,
    reg: &Compactness,
    cfg: &GrowthConfig,
    c: CellId,
) -> (f64, f64, Vec<Vec<f64>>) {
    let Ok(prism) = mesh.cell(c) else {
        return (f64::INFINITY, f64::INFINITY, Vec::new());
    };
    let mut dmisfit = 0.0;
    let mut contributions = Vec::with_capacity(modules.len());
    for module in modules {
        let contribution = module.contribution(&prism, seed.props());
        dmisfit += module.misfit_delta(&contribution);
        contributions.push(contribution);
    }
    if !dmisfit.is_finite() {
        return (f64::INFINITY, f64::INFINITY, Vec::new());
    }
    let score = dmisfit + cfg.regul * reg.gain(prism.center(), seed.centroid());
    if score.is_finite() {
        (score, dmisfit, contributions)
    } else {
        (f64::INFINITY, f64::INFINITY, Vec::new())
    }
}

fn validate_seeds(mesh: &PrismMesh, seeds: &[Seed]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::NoSeeds);
    }
    for (i, seed) in seeds.iter().enumerate() {
        if mesh.cell(seed.cell()).is_err() || !mesh.is_active(seed.cell()) {
            return Err(ConfigError::SeedCellInvalid(seed.cell()));
        }
        if seeds[..i].iter().any(|s| s.cell() == seed.cell()) {
            return Err(ConfigError::DuplicateSeed(seed.cell()));
        }
    }
    Ok(())
}
