//! In-process message-passing fabric.
//!
//! Workers exchange row content exclusively through channel endpoints; no
//! matrix state is ever shared between ranks. The fabric is a full mesh of
//! `std::sync::mpsc` channels, one per ordered rank pair, so point-to-point
//! delivery is FIFO per sender and collectives can fold contributions in
//! rank order. Collectives are centralized on rank 0, which keeps the
//! reduction deterministic and the barrier free of ordering races.
//!
//! A disconnected or panicked peer surfaces as
//! [`SolveError::CommunicationFailure`]; there is no timeout or retry.

use crate::error::SolveError;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Candidate pivot exchanged during the max-with-location reduction.
///
/// One record exists per rank per elimination step and is discarded as soon
/// as the step's winner is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotRecord {
    /// `|A[row][k]|` of the candidate.
    pub magnitude: f64,
    /// Global row index of the candidate.
    pub row: usize,
    /// Rank owning the candidate row.
    pub rank: usize,
}

impl PivotRecord {
    /// Sentinel contributed by ranks with no candidate rows; loses to every
    /// real candidate.
    pub fn absent(rank: usize) -> Self {
        PivotRecord {
            magnitude: -1.0,
            row: usize::MAX,
            rank,
        }
    }

    /// Deterministic winner rule: larger magnitude wins, ties go to the
    /// lower global row index. Equal (magnitude, row) pairs are resolved by
    /// fold order, which visits ranks in ascending order.
    fn beats(&self, other: &PivotRecord) -> bool {
        self.magnitude > other.magnitude
            || (self.magnitude == other.magnitude && self.row < other.row)
    }
}

/// Wire messages. Row payloads carry the matrix row plus its b entry.
enum Message {
    /// Row content: n matrix entries followed by the b entry.
    Row(Vec<f64>),
    /// Contribution to, or result of, the pivot reduction.
    Pivot(PivotRecord),
    /// A worker's owned rows flattened for the gather phase.
    Block(Vec<f64>),
    /// Final verdict broadcast by the coordinator: the solution or the
    /// agreed failure.
    Outcome(Result<Vec<f64>, SolveError>),
    /// Barrier token.
    Token,
}

impl Message {
    fn kind(&self) -> &'static str {
        match self {
            Message::Row(_) => "row",
            Message::Pivot(_) => "pivot",
            Message::Block(_) => "block",
            Message::Outcome(_) => "outcome",
            Message::Token => "token",
        }
    }
}

/// One rank's connection to every peer.
pub struct Endpoint {
    rank: usize,
    size: usize,
    /// peers[r] sends to rank r; None at this endpoint's own slot.
    peers: Vec<Option<Sender<Message>>>,
    /// inbox[r] receives from rank r.
    inbox: Vec<Option<Receiver<Message>>>,
}

/// Build a fully connected fabric of `size` endpoints, one per rank.
pub fn mesh(size: usize) -> Vec<Endpoint> {
    let mut senders: Vec<Vec<Option<Sender<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    let mut receivers: Vec<Vec<Option<Receiver<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

    for from in 0..size {
        for to in 0..size {
            if from == to {
                continue;
            }
            let (tx, rx) = channel();
            senders[from][to] = Some(tx);
            receivers[to][from] = Some(rx);
        }
    }

    senders
        .into_iter()
        .zip(receivers)
        .enumerate()
        .map(|(rank, (peers, inbox))| Endpoint {
            rank,
            size,
            peers,
            inbox,
        })
        .collect()
}

impl Endpoint {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn send(&self, to: usize, msg: Message) -> Result<(), SolveError> {
        let sender = self.peers.get(to).and_then(Option::as_ref).ok_or_else(|| {
            SolveError::CommunicationFailure(format!("rank {} has no link to {to}", self.rank))
        })?;
        sender.send(msg).map_err(|_| {
            SolveError::CommunicationFailure(format!("peer {to} disconnected"))
        })
    }

    fn recv(&self, from: usize) -> Result<Message, SolveError> {
        let receiver = self.inbox.get(from).and_then(Option::as_ref).ok_or_else(|| {
            SolveError::CommunicationFailure(format!("rank {} has no link from {from}", self.rank))
        })?;
        receiver.recv().map_err(|_| {
            SolveError::CommunicationFailure(format!("peer {from} disconnected"))
        })
    }

    fn unexpected(from: usize, got: &Message) -> SolveError {
        SolveError::CommunicationFailure(format!(
            "unexpected {} message from rank {from}",
            got.kind()
        ))
    }

    /// Point-to-point: send row content (matrix row plus b entry) to a peer.
    pub fn send_row(&self, to: usize, payload: &[f64]) -> Result<(), SolveError> {
        self.send(to, Message::Row(payload.to_vec()))
    }

    /// Point-to-point: receive row content from a peer. Blocks until
    /// delivered.
    pub fn recv_row(&self, from: usize) -> Result<Vec<f64>, SolveError> {
        match self.recv(from)? {
            Message::Row(payload) => Ok(payload),
            other => Err(Self::unexpected(from, &other)),
        }
    }

    /// Root side of a broadcast: deliver row content to every other rank.
    pub fn broadcast_row(&self, payload: &[f64]) -> Result<(), SolveError> {
        for to in 0..self.size {
            if to != self.rank {
                self.send(to, Message::Row(payload.to_vec()))?;
            }
        }
        Ok(())
    }

    /// Receiving side of a broadcast rooted at `root`.
    pub fn recv_broadcast(&self, root: usize) -> Result<Vec<f64>, SolveError> {
        self.recv_row(root)
    }

    /// Max-with-location reduction over all ranks' pivot candidates.
    ///
    /// Rank 0 folds contributions in ascending rank order with
    /// [`PivotRecord::beats`] and re-broadcasts the winner, so every rank
    /// returns the identical record. A singular-matrix verdict derived from
    /// it is therefore agreed on by all ranks with no extra messages.
    pub fn reduce_max_loc(&self, local: PivotRecord) -> Result<PivotRecord, SolveError> {
        if self.rank == 0 {
            let mut best = local;
            for from in 1..self.size {
                let contribution = match self.recv(from)? {
                    Message::Pivot(record) => record,
                    other => return Err(Self::unexpected(from, &other)),
                };
                if contribution.beats(&best) {
                    best = contribution;
                }
            }
            for to in 1..self.size {
                self.send(to, Message::Pivot(best))?;
            }
            Ok(best)
        } else {
            self.send(0, Message::Pivot(local))?;
            match self.recv(0)? {
                Message::Pivot(record) => Ok(record),
                other => Err(Self::unexpected(0, &other)),
            }
        }
    }

    /// Block until every rank has arrived.
    ///
    /// Centralized: ranks report to rank 0, which releases them once all
    /// tokens are in.
    pub fn barrier(&self) -> Result<(), SolveError> {
        if self.rank == 0 {
            for from in 1..self.size {
                match self.recv(from)? {
                    Message::Token => {}
                    other => return Err(Self::unexpected(from, &other)),
                }
            }
            for to in 1..self.size {
                self.send(to, Message::Token)?;
            }
        } else {
            self.send(0, Message::Token)?;
            match self.recv(0)? {
                Message::Token => {}
                other => return Err(Self::unexpected(0, &other)),
            }
        }
        Ok(())
    }

    /// Non-root side of the gather: ship this rank's flattened block to the
    /// coordinator.
    pub fn send_block(&self, to: usize, payload: Vec<f64>) -> Result<(), SolveError> {
        self.send(to, Message::Block(payload))
    }

    /// Coordinator side of the gather: collect every rank's block, in rank
    /// order, including the coordinator's own.
    pub fn collect_blocks(&self, own: Vec<f64>) -> Result<Vec<Vec<f64>>, SolveError> {
        let mut own = Some(own);
        let mut blocks = Vec::with_capacity(self.size);
        for from in 0..self.size {
            if from == self.rank {
                blocks.push(own.take().unwrap_or_default());
            } else {
                match self.recv(from)? {
                    Message::Block(payload) => blocks.push(payload),
                    other => return Err(Self::unexpected(from, &other)),
                }
            }
        }
        Ok(blocks)
    }

    /// Coordinator side of the final verdict broadcast.
    pub fn broadcast_outcome(&self, outcome: &Result<Vec<f64>, SolveError>) -> Result<(), SolveError> {
        for to in 0..self.size {
            if to != self.rank {
                self.send(to, Message::Outcome(outcome.clone()))?;
            }
        }
        Ok(())
    }

    /// Worker side of the final verdict broadcast: the coordinator's failure
    /// becomes this rank's failure.
    pub fn recv_outcome(&self, root: usize) -> Result<Vec<f64>, SolveError> {
        match self.recv(root)? {
            Message::Outcome(outcome) => outcome,
            other => Err(Self::unexpected(root, &other)),
        }
    }
}
