//! Parallel solvers for dense linear systems via Gaussian elimination.
//!
//! This crate solves `A x = b` by forward elimination with partial pivoting
//! and back-substitution, across three execution models:
//!
//! - **Sequential**: single-thread baseline ([`sequential::solve`])
//! - **Shared memory**: rayon-parallel row updates ([`threaded::solve`])
//! - **Distributed memory**: independent workers owning row partitions and
//!   coordinating exclusively over a message-passing fabric
//!   ([`distributed::solve`])
//!
//! The distributed variant is the core: per elimination step the workers run
//! a collective max-with-location pivot reduction, a pairwise row-content
//! exchange, a pivot-row broadcast, a local elimination pass, and a step
//! barrier. For a fixed input and worker count all three variants return
//! bit-identical solutions.
//!
//! # Example
//!
//! ```
//! use gauss_solvers::{distributed, system::LinearSystem, verify};
//!
//! let sys = LinearSystem::well_conditioned(50);
//! let x = distributed::solve(&sys.a, &sys.b, 4).unwrap();
//! assert!(verify::verify(&sys.a, &x, &sys.b));
//! ```

pub mod distributed;
pub mod error;
pub mod fabric;
pub mod partition;
pub mod report;
pub mod sequential;
pub mod system;
pub mod threaded;
pub mod verify;

pub use error::SolveError;
pub use partition::RowPartition;
pub use system::LinearSystem;

/// A pivot candidate below this magnitude marks the matrix as singular.
pub const PIVOT_TOLERANCE: f64 = 1e-12;
