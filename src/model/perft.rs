use std::{
    collections::BTreeMap,
    ops::{Deref, DerefMut},
    time::{Duration, Instant},
};

use crate::{
    model::{
        Move,
        legality::legal_moves,
        moving::{InversePatch, make_move, unmake_move},
        position::Position,
    },
    notation::coord::write_move,
};

/// Count the leaf nodes of the legal move tree below `start`, broken down
/// by first move.
pub fn perft<RC: RecursionStrategy>(start: &Position, depth: usize) -> PerftResult {
    let mut breakdown = BTreeMap::new();
    let now = Instant::now();
    let mut pos = start.clone();
    let topo = pos.topology();

    if depth != 0 {
        for mv in legal_moves(&pos) {
            let mut rec = RC::recurse(&mut pos, mv);
            let n = perft_recurse::<RC>(depth - 1, &mut *rec);
            breakdown.insert(write_move(mv, topo), n);
            RC::reclaim(rec);
        }
    }

    PerftResult {
        elapsed_duration: now.elapsed(),
        breakdown,
        depth,
    }
}

fn perft_recurse<RC: RecursionStrategy>(depth: usize, pos: &mut Position) -> usize {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len();
    }
    let mut res = 0;
    for mv in moves {
        let mut rec = RC::recurse(pos, mv);
        res += perft_recurse::<RC>(depth - 1, &mut *rec);
        RC::reclaim(rec);
    }
    res
}

pub struct PerftResult {
    pub depth: usize,
    pub elapsed_duration: Duration,
    pub breakdown: BTreeMap<String, usize>,
}

impl PerftResult {
    pub fn nodes(&self) -> usize {
        self.breakdown.values().sum()
    }

    pub fn pretty_print(&self) {
        println!("Performance test depth {}", self.depth);
        for (mv, n) in &self.breakdown {
            println!("{}: {}", mv, n);
        }
        println!(
            "Time elapsed: {:.02}ms",
            self.elapsed_duration.as_secs_f64() * 1000.0
        );
        println!(
            "Nodes per second: {:.02}",
            self.nodes() as f64 / self.elapsed_duration.as_secs_f64()
        );
        println!("Nodes searched: {}", self.nodes())
    }
}

/// How a child position is reached and left again.
pub trait RecursionStrategy {
    type Claim<'a>: DerefMut<Target = Position>;
    fn recurse(pos: &mut Position, mv: Move) -> Self::Claim<'_>;
    fn reclaim(claim: Self::Claim<'_>);
}

/// Play the move in place and revert it with its patch.
pub struct MakeUnmake;
pub struct UnmakeClaim<'a>(&'a mut Position, InversePatch);

impl Deref for UnmakeClaim<'_> {
    type Target = Position;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl DerefMut for UnmakeClaim<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl RecursionStrategy for MakeUnmake {
    type Claim<'a> = UnmakeClaim<'a>;

    #[inline]
    fn recurse(pos: &mut Position, mv: Move) -> Self::Claim<'_> {
        let (patch, _) = make_move(pos, mv);
        UnmakeClaim(pos, patch)
    }

    #[inline]
    fn reclaim(claim: Self::Claim<'_>) {
        unmake_move(claim.0, claim.1);
    }
}

/// Play the move on a copy and throw the copy away.
pub struct CloneMake;
pub struct DiscardCopyClaim(Position);

impl Deref for DiscardCopyClaim {
    type Target = Position;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DiscardCopyClaim {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl RecursionStrategy for CloneMake {
    type Claim<'a> = DiscardCopyClaim;

    #[inline]
    fn recurse(pos: &mut Position, mv: Move) -> Self::Claim<'_> {
        let mut copy = pos.clone();
        make_move(&mut copy, mv);
        DiscardCopyClaim(copy)
    }

    #[inline]
    fn reclaim(_claim: Self::Claim<'_>) {}
}
