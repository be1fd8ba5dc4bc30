//! Distributed-memory Gaussian elimination over the message fabric.
//!
//! A fixed set of workers, one per rank, each owns a contiguous block of
//! rows and communicates only through its [`fabric::Endpoint`]. Every
//! elimination step k runs the same strict sequence on every rank:
//!
//! 1. SelectingPivot — local max scan, then the max-with-location reduction;
//! 2. Relocating — pairwise content exchange so the slot of logical row k
//!    holds the pivot row's data (ownership ranges never change);
//! 3. Broadcasting — the owner of row k broadcasts the pivot row content;
//! 4. Eliminating — each rank updates its own sub-diagonal rows;
//! 5. Barrier — no rank starts step k+1 until all finished step k.
//!
//! After the forward phase, rank 0 gathers the triangularized blocks,
//! back-substitutes, and broadcasts the solution (or the agreed failure) to
//! every rank. The relocation is a true pairwise exchange: skipping the
//! return copy would silently drop part of the row permutation and corrupt
//! some pivot patterns.

use crate::error::SolveError;
use crate::fabric::{self, Endpoint, PivotRecord};
use crate::partition::RowPartition;
use crate::sequential::{back_substitute, eliminate_row};
use crate::PIVOT_TOLERANCE;
use ndarray::{s, Array1, Array2, ArrayView1};
use std::thread;

/// Rank that gathers the triangular system and back-substitutes.
const COORDINATOR: usize = 0;

/// Solve `A x = b` with `workers` message-passing workers.
///
/// Deterministic for a fixed input and worker count: repeated runs return
/// bit-identical solutions. On failure every worker has agreed on the same
/// verdict and the solution is unspecified.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>, workers: usize) -> Result<Array1<f64>, SolveError> {
    let n = crate::system::validate(a, b)?;
    if n == 0 || workers == 0 {
        return Err(SolveError::InvalidDimension { n, workers });
    }

    log::debug!("distributed solve: n = {n}, workers = {workers}");

    let results = thread::scope(|scope| {
        let handles: Vec<_> = fabric::mesh(workers)
            .into_iter()
            .map(|endpoint| {
                let part = RowPartition::new(n, workers, endpoint.rank());
                // Initial distribution: each worker copies out its own block.
                // From here on, row content moves only through the fabric.
                let block = a.slice(s![part.start..part.end, ..]).to_owned();
                let rhs = b.slice(s![part.start..part.end]).to_owned();
                scope.spawn(move || Worker::new(endpoint, part, n, block, rhs).run())
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle.join().map_err(|_| {
                    SolveError::CommunicationFailure(format!("worker {rank} panicked"))
                })?
            })
            .collect::<Vec<Result<Vec<f64>, SolveError>>>()
    });

    // All workers agree on the verdict; surface the coordinator's copy.
    let mut coordinator_x = None;
    for result in results {
        match result {
            Ok(x) => {
                if coordinator_x.is_none() {
                    coordinator_x = Some(x);
                }
            }
            Err(e) => return Err(e),
        }
    }
    coordinator_x
        .map(Array1::from_vec)
        .ok_or_else(|| SolveError::CommunicationFailure("no worker produced a result".into()))
}

/// Per-rank worker state: the owned row block and the fabric endpoint.
struct Worker {
    fabric: Endpoint,
    part: RowPartition,
    n: usize,
    /// Owned rows, `part.len()` by n.
    block: Array2<f64>,
    /// Owned entries of b.
    rhs: Array1<f64>,
}

impl Worker {
    fn new(fabric: Endpoint, part: RowPartition, n: usize, block: Array2<f64>, rhs: Array1<f64>) -> Self {
        Worker {
            fabric,
            part,
            n,
            block,
            rhs,
        }
    }

    fn run(mut self) -> Result<Vec<f64>, SolveError> {
        self.forward()?;
        self.finish()
    }

    fn local(&self, global: usize) -> usize {
        debug_assert!(self.part.contains(global));
        global - self.part.start
    }

    /// Matrix row plus its b entry, packed for the wire.
    fn pack_row(&self, local: usize) -> Vec<f64> {
        let mut payload = Vec::with_capacity(self.n + 1);
        payload.extend(self.block.row(local).iter());
        payload.push(self.rhs[local]);
        payload
    }

    fn unpack_row(&mut self, local: usize, payload: &[f64]) -> Result<(), SolveError> {
        if payload.len() != self.n + 1 {
            return Err(SolveError::CommunicationFailure(format!(
                "row payload of length {}, expected {}",
                payload.len(),
                self.n + 1
            )));
        }
        self.block
            .row_mut(local)
            .assign(&ArrayView1::from(&payload[..self.n]));
        self.rhs[local] = payload[self.n];
        Ok(())
    }

    /// Forward phase: n-1 totally ordered elimination steps.
    fn forward(&mut self) -> Result<(), SolveError> {
        for k in 0..self.n.saturating_sub(1) {
            let winner = self.select_pivot(k)?;

            // The reduction hands every rank the same winning record, so a
            // singular verdict is reached by all ranks at the same step.
            if winner.magnitude < PIVOT_TOLERANCE {
                log::debug!("rank {}: singular at step {k}", self.fabric.rank());
                return Err(SolveError::SingularMatrix);
            }

            self.relocate(k, &winner)?;
            let pivot = self.broadcast_pivot(k)?;
            self.eliminate(k, &pivot);
            self.fabric.barrier()?;
        }
        Ok(())
    }

    /// SelectingPivot: local scan over owned rows with global index >= k,
    /// then the collective reduction.
    fn select_pivot(&self, k: usize) -> Result<PivotRecord, SolveError> {
        let rank = self.fabric.rank();
        let mut local = PivotRecord::absent(rank);
        for row in self.part.rows() {
            if row < k {
                continue;
            }
            let magnitude = self.block[[self.local(row), k]].abs();
            // Strict comparison: the lowest owned row index wins local ties.
            if magnitude > local.magnitude {
                local = PivotRecord {
                    magnitude,
                    row,
                    rank,
                };
            }
        }
        self.fabric.reduce_max_loc(local)
    }

    /// Relocating: swap the content of logical row k and the winning pivot
    /// row between their owners. Ownership ranges never change; only row
    /// content moves.
    fn relocate(&mut self, k: usize, winner: &PivotRecord) -> Result<(), SolveError> {
        if winner.row == k {
            return Ok(());
        }
        let owner_k = RowPartition::owner(self.n, self.fabric.size(), k);

        if winner.rank == owner_k {
            // Same owner: plain local swap.
            if self.fabric.rank() == owner_k {
                let (lk, lw) = (self.local(k), self.local(winner.row));
                for j in 0..self.n {
                    self.block.swap([lk, j], [lw, j]);
                }
                self.rhs.swap(lk, lw);
            }
            return Ok(());
        }

        // Cross-rank rendezvous: both sides send their row, then receive the
        // other's into the vacated slot. Channel sends never block, so the
        // symmetric send-then-receive cannot deadlock.
        if self.fabric.rank() == owner_k {
            let lk = self.local(k);
            let outgoing = self.pack_row(lk);
            self.fabric.send_row(winner.rank, &outgoing)?;
            let incoming = self.fabric.recv_row(winner.rank)?;
            self.unpack_row(lk, &incoming)?;
        } else if self.fabric.rank() == winner.rank {
            let lw = self.local(winner.row);
            let outgoing = self.pack_row(lw);
            self.fabric.send_row(owner_k, &outgoing)?;
            let incoming = self.fabric.recv_row(owner_k)?;
            self.unpack_row(lw, &incoming)?;
        }
        Ok(())
    }

    /// Broadcasting: after relocation the owner of logical row k holds the
    /// pivot content and distributes it to every rank.
    fn broadcast_pivot(&mut self, k: usize) -> Result<Vec<f64>, SolveError> {
        let owner_k = RowPartition::owner(self.n, self.fabric.size(), k);
        if self.fabric.rank() == owner_k {
            let payload = self.pack_row(self.local(k));
            self.fabric.broadcast_row(&payload)?;
            Ok(payload)
        } else {
            let payload = self.fabric.recv_broadcast(owner_k)?;
            if payload.len() != self.n + 1 {
                return Err(SolveError::CommunicationFailure(format!(
                    "pivot payload of length {}, expected {}",
                    payload.len(),
                    self.n + 1
                )));
            }
            Ok(payload)
        }
    }

    /// Eliminating: purely local update of owned rows with global index > k,
    /// reading the just-broadcast pivot row.
    fn eliminate(&mut self, k: usize, pivot: &[f64]) {
        let pivot_row = ArrayView1::from(&pivot[..self.n]);
        let pivot_rhs = pivot[self.n];
        for row in self.part.rows() {
            if row <= k {
                continue;
            }
            let l = self.local(row);
            let rhs = &mut self.rhs[l];
            eliminate_row(self.block.row_mut(l), rhs, pivot_row, pivot_rhs, k);
        }
    }

    /// Gather at the coordinator, final diagonal check, back-substitution,
    /// and the verdict broadcast back to every rank.
    fn finish(self) -> Result<Vec<f64>, SolveError> {
        let mut payload = Vec::with_capacity(self.part.len() * (self.n + 1));
        payload.extend(self.block.iter());
        payload.extend(self.rhs.iter());

        if self.fabric.rank() == COORDINATOR {
            let blocks = self.fabric.collect_blocks(payload)?;
            let outcome = self.assemble_and_substitute(blocks);
            self.fabric.broadcast_outcome(&outcome)?;
            outcome
        } else {
            self.fabric.send_block(COORDINATOR, payload)?;
            self.fabric.recv_outcome(COORDINATOR)
        }
    }

    /// Rebuild the full triangular system from the gathered blocks and
    /// solve it. Runs on the coordinator only.
    fn assemble_and_substitute(&self, blocks: Vec<Vec<f64>>) -> Result<Vec<f64>, SolveError> {
        let n = self.n;
        let mut a = Array2::zeros((n, n));
        let mut b = Array1::zeros(n);

        for (rank, block) in blocks.iter().enumerate() {
            let part = RowPartition::new(n, self.fabric.size(), rank);
            let rows = part.len();
            if block.len() != rows * (n + 1) {
                return Err(SolveError::CommunicationFailure(format!(
                    "gathered block from rank {rank} has length {}, expected {}",
                    block.len(),
                    rows * (n + 1)
                )));
            }
            for (i, row) in part.rows().enumerate() {
                a.row_mut(row)
                    .assign(&ArrayView1::from(&block[i * n..(i + 1) * n]));
                b[row] = block[rows * n + i];
            }
        }

        // Defense in depth: the pivot reduction should already have caught
        // a vanishing final diagonal.
        if a[[n - 1, n - 1]].abs() < PIVOT_TOLERANCE {
            return Err(SolveError::SingularMatrix);
        }

        Ok(back_substitute(&a, &b).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::LinearSystem;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_three_by_three_scenario() {
        let a = array![[2.0, 1.0, 1.0], [1.0, 3.0, 1.0], [1.0, 1.0, 4.0]];
        let b = array![8.0, 11.0, 16.0];
        let expected = [1.875, 2.625, 2.875];
        for workers in [1, 3] {
            let x = solve(&a, &b, workers).unwrap();
            for i in 0..3 {
                assert_relative_eq!(x[i], expected[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_matches_sequential_bitwise() {
        let sys = LinearSystem::random_dominant(48, 3);
        let reference = crate::sequential::solve(&sys.a, &sys.b).unwrap();
        for workers in [1, 2, 3, 4, 7] {
            let x = solve(&sys.a, &sys.b, workers).unwrap();
            assert_eq!(x, reference, "workers = {workers}");
        }
    }

    #[test]
    fn test_relocation_crosses_rank_boundaries() {
        // Column 0 is largest in the last row, which a 3-worker split hands
        // to rank 2 while rank 0 owns logical row 0: the exchange must cross
        // ranks and preserve the full permutation.
        let a = array![
            [1.0, 2.0, 0.0, 1.0],
            [2.0, 9.0, 3.0, 1.0],
            [3.0, 1.0, 8.0, 2.0],
            [9.0, 2.0, 1.0, 7.0]
        ];
        let b = array![4.0, 15.0, 14.0, 19.0];
        let reference = crate::sequential::solve(&a, &b).unwrap();
        for workers in [2, 3, 4] {
            let x = solve(&a, &b, workers).unwrap();
            assert_eq!(x, reference, "workers = {workers}");
        }
    }

    #[test]
    fn test_more_workers_than_rows() {
        let sys = LinearSystem::well_conditioned(3);
        let reference = crate::sequential::solve(&sys.a, &sys.b).unwrap();
        let x = solve(&sys.a, &sys.b, 8).unwrap();
        assert_eq!(x, reference);
    }

    #[test]
    fn test_singular_verdict_is_agreed() {
        let a = array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [4.0, 5.0, 6.0]];
        let b = array![1.0, 0.0, 2.0];
        for workers in [1, 2, 3] {
            assert_eq!(solve(&a, &b, workers), Err(SolveError::SingularMatrix));
        }
    }

    #[test]
    fn test_determinism_across_runs() {
        let sys = LinearSystem::random_dominant(32, 5);
        let first = solve(&sys.a, &sys.b, 4).unwrap();
        let second = solve(&sys.a, &sys.b, 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_workers_is_invalid() {
        let sys = LinearSystem::well_conditioned(4);
        assert_eq!(
            solve(&sys.a, &sys.b, 0),
            Err(SolveError::InvalidDimension { n: 4, workers: 0 })
        );
    }
}
