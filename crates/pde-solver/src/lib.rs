//! PDE time-stepping engine: term assembly, boundary corrections, CFL-limited
//! step selection and the outer solve loop.

mod bc;
mod error;
mod pde;
mod rhs;
mod solver;
mod stepping;
mod term;
mod time;

pub use bc::{CharacteristicCorrection, NonReflectiveBc, SlipWallCorrection};
pub use error::SolverError;
pub use pde::{Pde, RHS, SOLUTION, WAVE_SPEED};
pub use rhs::ComputeRhs;
pub use solver::PdeSolver;
pub use stepping::TimeStepping;
pub use term::{ElementContribution, Term, TermComputer, TermResult};
pub use time::{Time, TimeStepComputer, TimeStepMode};
