//! Worker process entry point: one per MPI-style rank, started by an
//! external launcher that sets `PDE_COMM_WORLD_RANK` before exec'ing this
//! binary. A bare invocation (no launcher) is refused.

use anyhow::{bail, Context};
use clap::Parser;
use pde_comm::{Comm, LocalCluster};
use pde_mesh::{BilinearQuad, Dictionary, Entities, Mesh, Space as MeshSpace};
use pde_solver::{ElementContribution, Pde, PdeSolver, Term, TermComputer, TimeStepComputer, TimeStepMode};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pde-worker", about = "Runs one rank's share of a PDE solve")]
struct Args {
    /// Path to the run's TOML configuration; defaults to ./solver.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the rolling log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Overrides `solver.max_iteration` from the configuration file
    #[arg(long)]
    iterations: Option<u64>,
}

fn configure_logging(log_dir: &std::path::Path, level: &str) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir).with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "pde-worker.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(non_blocking).with_ansi(false).try_init().ok();
    Ok(guard)
}

/// A single constant-coefficient advection term: uniform flux and wave
/// speed everywhere, enough to drive a real solve without a full scheme
/// library wired in.
struct ConstantAdvection {
    entities_name: String,
    flux: f64,
    wave_speed: f64,
}

impl Term for ConstantAdvection {
    fn entities_name(&self) -> &str {
        &self.entities_name
    }

    fn nb_eqs(&self) -> usize {
        1
    }

    fn compute_element(&self, entities: &Entities, _local_idx: usize, _elem_coords: &[[f64; 3]]) -> ElementContribution {
        let n = entities.shape.nb_nodes();
        ElementContribution { term: vec![self.flux; n], wave_speed: vec![self.wave_speed; n] }
    }
}

/// Builds a single-rank strip of `nb_cells` unit quads sharing edges, since
/// no binary mesh reader exists yet to load `config.mesh.source` from disk.
fn build_strip_mesh(nb_cells: usize) -> Mesh {
    let nb_cells = nb_cells.max(1);
    let nb_nodes = 2 * (nb_cells + 1);
    let mut mesh = Mesh::new(2, 0);
    mesh.geometry.resize(nb_nodes);
    for i in 0..=nb_cells {
        let x = i as f64;
        mesh.geometry.coordinates.set_row(2 * i, &[x, 0.0]).expect("row in range");
        mesh.geometry.coordinates.set_row(2 * i + 1, &[x, 1.0]).expect("row in range");
    }

    let mut quads = Entities::new("quads", Arc::new(BilinearQuad), true);
    quads.resize(nb_cells);
    let mut space = MeshSpace::new(Arc::new(BilinearQuad));
    space.connectivity.resize(nb_cells);
    for i in 0..nb_cells {
        let (bl, tl, tr, br) = (2 * i, 2 * i + 1, 2 * i + 3, 2 * i + 2);
        let row = [bl as u64, br as u64, tr as u64, tl as u64];
        quads.node_connectivity.set_row(i, &row).expect("row in range");
        space.connectivity.set_row(i, &row).expect("row in range");
    }
    mesh.geometry.add_space("quads", space);
    mesh.topology.add_entities(quads);
    mesh
}

fn build_pde(dictionary: Dictionary, nb_eqs: usize, cfg: &pde_config::Config) -> Pde {
    let mut pde = Pde::new(dictionary, nb_eqs).with_time(cfg.file.solver.time_accurate);
    pde.compute_rhs.add_term(TermComputer::new(
        "advection",
        Box::new(ConstantAdvection { entities_name: "quads".to_string(), flux: 1.0, wave_speed: 1.0 }),
    ));
    if let Some(time) = pde.time.as_mut() {
        time.end_time = cfg.file.solver.end_time;
    }
    pde
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut cfg = pde_config::load_from(args.config.clone()).context("loading worker configuration")?;
    let _log_guard = configure_logging(&args.log_dir, &cfg.file.logging.level)?;

    tracing::info!(mesh_source = %cfg.file.mesh.source.display(), "starting worker");

    let cluster = LocalCluster::new(1);
    let comm = cluster.comm(0);
    cfg.apply_nb_ranks(comm.size() as u64);
    if cfg.file.partition.nb_parts > 1 {
        tracing::warn!(
            requested = cfg.file.partition.nb_parts,
            "this process drives a single rank; spawning the other ranks is the launcher's job"
        );
    }

    let mesh = build_strip_mesh(8);
    let Mesh { topology, geometry } = mesh;
    let pde = build_pde(geometry, 1, &cfg);

    let history_path = args.log_dir.join("history.tsv");
    let time_step = TimeStepComputer::new(cfg.file.solver.cfl, TimeStepMode::TimeAccurate);
    let max_iteration = args.iterations.unwrap_or(cfg.file.solver.max_iteration);
    let mut solver = PdeSolver::new(pde, topology, time_step, max_iteration, comm.rank() as u64);
    solver.setup();
    solver.history = Some(pde_history::History::new(history_path));

    solver.solve_iterations(max_iteration, &comm).context("solving")?;

    tracing::info!(iterations = solver.iterations_run(), "worker finished");

    let basename = args.log_dir.join("result");
    let mut writer = pde_persist::BinaryDataWriter::create(&basename, &comm).context("opening result writer")?;
    let solution = solver.pde.fields.field(pde_solver::SOLUTION).context("reading solution field")?;
    let nb_rows = solution.nb_dofs() as u64;
    let nb_cols = solution.data.row_size() as u64;
    let mut bytes = Vec::with_capacity(solution.data.size() * solution.data.row_size() * 8);
    for row in solution.data.rows() {
        for value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    writer.write_data_block(&bytes, "solution", nb_rows, nb_cols, "f64", &comm).context("writing solution block")?;
    writer.close(&comm).context("closing result writer")?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if std::env::var_os("PDE_COMM_WORLD_RANK").is_none() {
        bail!("pde-worker must be started by a launcher that sets PDE_COMM_WORLD_RANK; refusing to run standalone");
    }

    run(args)
}
