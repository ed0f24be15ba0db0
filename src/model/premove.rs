//! # Premoves
//!
//! A client keeps two games. The confirmed one only ever sees moves the
//! server has broadcast. The local one runs ahead of it with the player's
//! own moves before the server echoes them, so the board responds at once.
//! Moves queued while the opponent is thinking are premoves: they are
//! checked loosely when queued and played the moment the turn comes back.
//!
//! Whenever the server disagrees with the local game, the local game is
//! thrown away and replaced by a copy of the confirmed one.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::model::{
    Color, Move,
    game::Game,
    movegen::{GenMode, generate},
};

#[derive(Debug, Clone)]
pub struct PremoveQueue {
    color: Color,
    confirmed: Game,
    local: Game,
    /// Own moves played locally and not yet echoed by the server.
    pending: VecDeque<Move>,
    premoves: VecDeque<Move>,
}

impl PremoveQueue {
    pub fn new(game: Game, color: Color) -> Self {
        Self {
            color,
            local: game.clone(),
            confirmed: game,
            pending: VecDeque::new(),
            premoves: VecDeque::new(),
        }
    }

    #[inline]
    pub fn confirmed(&self) -> &Game {
        &self.confirmed
    }

    /// The game as the player sees it.
    #[inline]
    pub fn local(&self) -> &Game {
        &self.local
    }

    pub fn pending(&self) -> impl Iterator<Item = &Move> {
        self.pending.iter()
    }

    pub fn premoves(&self) -> impl Iterator<Item = &Move> {
        self.premoves.iter()
    }

    pub fn cancel_premoves(&mut self) {
        self.premoves.clear();
    }

    /// Play an own move on the local game. Returns the move to send to
    /// the server, with castling and promotion filled in.
    pub fn play_local(&mut self, mv: Move) -> Option<Move> {
        if self.local.position().turn() != self.color {
            return None;
        }
        let sent = self.local.submit(mv)?.mv;
        self.pending.push_back(sent);
        Some(sent)
    }

    /// Queue a move to be played when the turn comes back. Only the
    /// movement pattern of the piece is checked, against the board as the
    /// player currently sees it.
    pub fn queue_premove(&mut self, mv: Move) -> bool {
        let pos = self.local.position();
        let plausible = match mv.from_square() {
            Some(from) => pos.at(from).is_some_and(|p| {
                p.color == self.color && generate(pos, p.id, GenMode::PREMOVES).contains(&mv.to)
            }),
            None => true,
        };
        if plausible {
            self.premoves.push_back(mv);
        }
        plausible
    }

    /// Apply a move broadcast by the server. Returns a premove that has
    /// just been played locally and must be sent.
    pub fn confirm(&mut self, server: Move) -> Option<Move> {
        if self.confirmed.submit(server).is_none() {
            warn!(?server, "server move rejected by the confirmed game");
            self.rollback();
            return None;
        }

        match self.pending.front() {
            Some(&ours) if ours == server => {
                self.pending.pop_front();
            }
            Some(&ours) => {
                warn!(?ours, ?server, "local game diverged from the server");
                self.rollback();
            }
            None => {
                if self.local.submit(server).is_none() {
                    warn!(?server, "server move rejected by the local game");
                    self.rollback();
                }
            }
        }

        self.play_premove()
    }

    fn play_premove(&mut self) -> Option<Move> {
        if self.local.position().turn() != self.color || self.local.result().is_some() {
            return None;
        }
        let mv = self.premoves.pop_front()?;
        let sent = self.play_local(mv);
        if sent.is_none() {
            debug!(?mv, dropped = self.premoves.len(), "premove illegal, queue cleared");
            self.premoves.clear();
        }
        sent
    }

    fn rollback(&mut self) {
        self.local = self.confirmed.clone();
        self.pending.clear();
        self.premoves.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{setup::start_position, topology::Topology, variants::VariantSet},
        notation::coord::parse_move,
    };

    fn mv(text: &str) -> Move {
        parse_move(text, Topology::STANDARD).unwrap()
    }

    fn queue() -> PremoveQueue {
        PremoveQueue::new(
            Game::new(start_position(VariantSet::STANDARD, None)),
            Color::WHITE,
        )
    }

    #[test]
    fn premove_fires_on_the_opponents_move() {
        let mut q = queue();
        assert_eq!(q.play_local(mv("e2e4")), Some(mv("e2e4")));
        assert_eq!(q.play_local(mv("d2d4")), None);
        assert!(q.queue_premove(mv("g1f3")));
        assert!(!q.queue_premove(mv("e4e6")));
        assert!(!q.queue_premove(mv("e7e5")));

        assert_eq!(q.confirm(mv("e2e4")), None);
        assert_eq!(q.pending().count(), 0);
        assert_eq!(q.confirm(mv("e7e5")), Some(mv("g1f3")));
        assert_eq!(q.local().len(), 3);
        assert_eq!(q.confirmed().len(), 2);

        assert_eq!(q.confirm(mv("g1f3")), None);
        assert_eq!(q.local().position(), q.confirmed().position());
    }

    #[test]
    fn blocked_premove_clears_the_queue() {
        let mut q = queue();
        q.play_local(mv("e2e4"));
        assert!(q.queue_premove(mv("e4e5")));
        assert!(q.queue_premove(mv("d2d4")));
        q.confirm(mv("e2e4"));
        assert_eq!(q.confirm(mv("e7e5")), None);
        assert_eq!(q.premoves().count(), 0);
    }

    #[test]
    fn divergence_rolls_back() {
        let mut q = queue();
        q.play_local(mv("d2d4"));
        assert!(q.queue_premove(mv("c2c4")));
        assert_eq!(q.confirm(mv("e2e4")), None);
        assert_eq!(q.pending().count(), 0);
        assert_eq!(q.premoves().count(), 0);
        assert_eq!(q.local().position(), q.confirmed().position());
        assert_eq!(q.local().len(), 1);
    }
}
