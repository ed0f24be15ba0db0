//! # Game history
//!
//! A [`Game`] owns the live position together with every move played on
//! it. Each entry keeps the [`InversePatch`] of its move, so the cursor
//! walks backwards and forwards through the game one move at a time
//! without replaying it from the start.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{
    Color, Move, PieceId, PieceType, Square, castling,
    hash::hash_position,
    legality::{in_check, legal_moves},
    movegen::needs_promotion,
    moving::{InversePatch, make_move, unmake_move},
    outcome::{GameResult, ResultReason, evaluate, has_mating_material},
    position::Position,
    vision::{DarkChessMove, visible_squares},
};
use crate::notation::san::write_san;

/// A move as it is recorded and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedMove {
    pub mv: Move,
    pub color: Color,
    pub piece: PieceId,
    pub kind: PieceType,
    /// Pieces that left the board because of this move.
    pub casualties: Vec<PieceId>,
    pub san: String,
    /// Material of each side before the move.
    pub material: [u32; 2],
    pub check: bool,
    pub mate: bool,
    pub timestamp: Option<DateTime<Utc>>,
    /// Time since the previous move.
    pub duration_ms: Option<i64>,
    /// Total thinking time of each side once this move is made.
    pub elapsed_ms: [i64; 2],
}

#[derive(Debug, Clone)]
struct Ply {
    record: ExtendedMove,
    patch: InversePatch,
    /// Repetition key of the position this move leads to.
    key: u64,
}

#[derive(Debug, Clone)]
pub struct Game {
    initial: Position,
    position: Position,
    history: Vec<Ply>,
    cursor: usize,
    result: Option<GameResult>,
    repetitions: IndexMap<u64, u8>,
}

impl Game {
    pub fn new(initial: Position) -> Self {
        let mut repetitions = IndexMap::new();
        repetitions.insert(hash_position(&initial), 1);
        Self {
            position: initial.clone(),
            initial,
            history: vec![],
            cursor: 0,
            result: None,
            repetitions,
        }
    }

    /// The position at the cursor.
    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn initial(&self) -> &Position {
        &self.initial
    }

    #[inline]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Number of moves before the cursor.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn moves(&self) -> impl Iterator<Item = &ExtendedMove> {
        self.history.iter().map(|p| &p.record)
    }

    pub fn last_move(&self) -> Option<&ExtendedMove> {
        self.cursor.checked_sub(1).map(|i| &self.history[i].record)
    }

    /// How often the position at the cursor has occurred in the recorded
    /// game.
    pub fn repetitions(&self) -> u8 {
        self.count(hash_position(&self.position))
    }

    fn count(&self, key: u64) -> u8 {
        self.repetitions.get(&key).copied().unwrap_or(0)
    }

    /// The position after the last recorded move, wherever the cursor is.
    pub fn live_position(&self) -> Cow<'_, Position> {
        if self.cursor == self.history.len() {
            Cow::Borrowed(&self.position)
        } else {
            Cow::Owned(self.position_at(self.history.len()))
        }
    }

    /// Play a move without a clock.
    pub fn submit(&mut self, mv: Move) -> Option<&ExtendedMove> {
        self.play(mv, None)
    }

    /// Play a move received at `now`.
    pub fn submit_at(&mut self, mv: Move, now: DateTime<Utc>) -> Option<&ExtendedMove> {
        self.play(mv, Some(now))
    }

    /// Validate and carry out a move at the end of the game.
    ///
    /// Anything but a legal move in an unfinished game is ignored. A cursor
    /// navigated back returns to the end first, since the recorded moves
    /// stay as they were.
    fn play(&mut self, mv: Move, now: Option<DateTime<Utc>>) -> Option<&ExtendedMove> {
        if let Some(result) = self.result {
            debug!(?mv, reason = %result.reason, "move after game end rejected");
            return None;
        }
        self.navigate_to(self.history.len());
        let mv = self.complete(mv);
        if !legal_moves(&self.position).contains(&mv) {
            debug!(?mv, "illegal move rejected");
            return None;
        }

        let before = self.position.clone();
        let material = [
            before.material(Color::WHITE),
            before.material(Color::BLACK),
        ];
        let (patch, report) = make_move(&mut self.position, mv);
        let result = evaluate(&self.position, report.mover);
        let check = !self.position.variants().no_checks()
            && in_check(&self.position, report.mover.opp());
        let mate = result.is_some_and(|r| r.reason.is_checkmate());
        let san = write_san(&before, mv, check, mate);

        let previous = self.history.last().map(|p| &p.record);
        let duration_ms = now
            .zip(previous.and_then(|p| p.timestamp))
            .map(|(now, then)| (now - then).num_milliseconds());
        let mut elapsed_ms = previous.map(|p| p.elapsed_ms).unwrap_or_default();
        elapsed_ms[report.mover.ix()] += duration_ms.unwrap_or(0);

        let record = ExtendedMove {
            mv,
            color: report.mover,
            piece: report.piece,
            kind: report.kind,
            casualties: report.casualties,
            san,
            material,
            check,
            mate,
            timestamp: now,
            duration_ms,
            elapsed_ms,
        };
        debug!(
            mover = ?record.color,
            san = %record.san,
            captures = record.casualties.len(),
            "move played"
        );

        let key = hash_position(&self.position);
        *self.repetitions.entry(key).or_default() += 1;
        self.history.push(Ply { record, patch, key });
        self.cursor = self.history.len();
        if let Some(result) = result {
            self.finish(result);
        }
        self.history.last().map(|p| &p.record)
    }

    /// Fill in what a client may leave out: castling by moving the king
    /// onto its rook, and a queen for an unspecified promotion.
    fn complete(&self, mv: Move) -> Move {
        let mut mv = castling::normalize(&self.position, mv);
        if mv.promotion.is_none() {
            if let Some(id) = mv.from_square().and_then(|sq| self.position.id_at(sq)) {
                if needs_promotion(&self.position, id, mv.to) {
                    mv.promotion = Some(PieceType::QUEEN);
                }
            }
        }
        mv
    }

    fn finish(&mut self, result: GameResult) {
        info!(winner = ?result.winner, reason = %result.reason, plies = self.history.len(), "game over");
        self.result = Some(result);
    }

    /// Step the cursor back one move.
    pub fn move_back(&mut self) -> bool {
        let Some(ix) = self.cursor.checked_sub(1) else {
            return false;
        };
        unmake_move(&mut self.position, self.history[ix].patch.clone());
        self.cursor = ix;
        true
    }

    /// Step the cursor forward one recorded move.
    pub fn move_forward(&mut self) -> bool {
        let Some(ply) = self.history.get(self.cursor) else {
            return false;
        };
        let mv = ply.record.mv;
        make_move(&mut self.position, mv);
        self.cursor += 1;
        true
    }

    /// Move the cursor to just after the `ply`th move. Panics past the
    /// end of the game.
    pub fn navigate_to(&mut self, ply: usize) {
        assert!(
            ply <= self.history.len(),
            "ply {ply} is past the end of a {} move game",
            self.history.len()
        );
        while self.cursor > ply {
            self.move_back();
        }
        while self.cursor < ply {
            self.move_forward();
        }
    }

    /// Rebuild the position at the cursor from the initial position.
    pub fn replay_from_start(&mut self) {
        let mut pos = self.initial.clone();
        for ply in &self.history[..self.cursor] {
            make_move(&mut pos, ply.record.mv);
        }
        self.position = pos;
    }

    /// A copy of the position after `ply` moves. Panics past the end of
    /// the game.
    pub fn position_at(&self, ply: usize) -> Position {
        assert!(
            ply <= self.history.len(),
            "ply {ply} is past the end of a {} move game",
            self.history.len()
        );
        let mut pos = self.position.clone();
        for ix in (ply..self.cursor).rev() {
            unmake_move(&mut pos, self.history[ix].patch.clone());
        }
        for ix in self.cursor..ply {
            make_move(&mut pos, self.history[ix].record.mv);
        }
        pos
    }

    pub fn resign(&mut self, color: Color) -> Option<GameResult> {
        self.end(GameResult::win(color.opp(), ResultReason::RESIGNATION))
    }

    pub fn agree_draw(&mut self) -> Option<GameResult> {
        self.end(GameResult::draw(ResultReason::AGREED_DRAW))
    }

    /// `color` ran out of time. Their opponent wins unless they have
    /// nothing left to mate with.
    pub fn flag(&mut self, color: Color) -> Option<GameResult> {
        let result = if has_mating_material(&self.live_position(), color.opp()) {
            GameResult::win(color.opp(), ResultReason::TIMEOUT)
        } else {
            GameResult::draw(ResultReason::INSUFFICIENT_MATERIAL_AND_TIMEOUT)
        };
        self.end(result)
    }

    /// Draw by threefold repetition, if the position at the end of the
    /// game has occurred three times.
    pub fn claim_threefold(&mut self) -> Option<GameResult> {
        let key = self
            .history
            .last()
            .map_or_else(|| hash_position(&self.initial), |p| p.key);
        let seen = self.count(key);
        if seen < 3 {
            debug!(seen, "threefold claim rejected");
            return None;
        }
        self.end(GameResult::draw(ResultReason::THREEFOLD_REPETITION))
    }

    fn end(&mut self, result: GameResult) -> Option<GameResult> {
        if self.result.is_some() {
            return None;
        }
        self.finish(result);
        Some(result)
    }

    /// Squares `color` could see after `ply` moves.
    pub fn visibility_at(&self, ply: usize, color: Color) -> IndexSet<Square> {
        visible_squares(&self.position_at(ply), color)
    }

    /// The `ply`th move (counting from zero) as `viewer` may see it.
    pub fn redacted_move(&self, ply: usize, viewer: Color) -> DarkChessMove {
        let record = &self.history[ply].record;
        let before = self.position_at(ply);
        let after = self.position_at(ply + 1);
        DarkChessMove::redact(&before, &after, record.mv, &record.casualties, viewer)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::{
        model::{
            setup::start_position,
            variants::{Variant, VariantSet},
        },
        notation::{coord::parse_move, fen::parse_position},
    };

    fn mv(game: &Game, text: &str) -> Move {
        parse_move(text, game.position().topology()).unwrap()
    }

    fn play(game: &mut Game, moves: &[&str]) {
        for text in moves {
            let m = mv(game, text);
            assert!(game.submit(m).is_some(), "{text}");
        }
    }

    #[test]
    fn records_san_and_material() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        play(&mut game, &["e2e4", "d7d5", "e4d5"]);
        let sans: Vec<_> = game.moves().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, ["e4", "d5", "exd5"]);
        let last = game.last_move().unwrap();
        assert_eq!(last.material, [39, 39]);
        assert_eq!(last.casualties.len(), 1);
        assert_eq!(game.position().material(Color::BLACK), 38);
    }

    #[test]
    fn rejects_illegal_moves() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        let m = mv(&game, "e2e5");
        assert!(game.submit(m).is_none());
        let m = mv(&game, "e7e5");
        assert!(game.submit(m).is_none());
        assert!(game.is_empty());
    }

    #[test]
    fn fools_mate() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let last = game.last_move().unwrap();
        assert_eq!(last.san, "Qh4#");
        assert!(last.check && last.mate);
        assert_eq!(
            game.result(),
            Some(GameResult::win(Color::BLACK, ResultReason::CHECKMATE))
        );
        let m = mv(&game, "a2a3");
        assert!(game.submit(m).is_none());
    }

    #[test]
    fn default_promotion_and_king_onto_rook() {
        let pos = parse_position("4k3/1P6/8/8/8/8/8/4K2R w K - 0 1", VariantSet::STANDARD)
            .unwrap();
        let mut game = Game::new(pos);
        let m = mv(&game, "b7b8");
        assert_eq!(game.submit(m).map(|m| m.san.as_str()), Some("b8=Q+"));
        play(&mut game, &["e8e7"]);
        let m = mv(&game, "e1h1");
        assert_eq!(game.submit(m).map(|m| m.san.as_str()), Some("O-O"));
    }

    #[test]
    fn navigation_restores_positions() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        play(&mut game, &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
        let end = game.position().clone();
        let after_two = game.position_at(2);

        game.navigate_to(2);
        assert_eq!(game.cursor(), 2);
        assert_eq!(game.position(), &after_two);
        assert!(game.move_back());
        assert!(game.move_back());
        assert!(!game.move_back());
        assert_eq!(game.position(), game.initial());

        game.navigate_to(5);
        assert_eq!(game.position(), &end);
        assert!(!game.move_forward());

        game.navigate_to(3);
        let here = game.position().clone();
        game.replay_from_start();
        assert_eq!(game.position(), &here);
    }

    #[test]
    #[should_panic]
    fn navigating_past_the_end_panics() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        game.navigate_to(1);
    }

    #[test]
    fn submitting_while_navigated_back_keeps_the_record() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        play(&mut game, &["e2e4", "e7e5", "g1f3", "b8c6"]);

        game.navigate_to(2);
        let m = mv(&game, "g1f3");
        assert!(game.submit(m).is_none());
        assert_eq!(game.len(), 4);

        game.navigate_to(2);
        play(&mut game, &["d2d4"]);
        assert_eq!(game.len(), 5);
        assert_eq!(game.cursor(), 5);
        let sans: Vec<_> = game.moves().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, ["e4", "e5", "Nf3", "Nc6", "d4"]);
    }

    #[test]
    fn endings_judge_the_live_position() {
        let pos = parse_position("3qk3/8/8/8/8/8/8/R2QK3 w - - 0 1", VariantSet::STANDARD)
            .unwrap();
        let mut game = Game::new(pos);
        play(&mut game, &["d1d8", "e8d8"]);
        game.navigate_to(0);
        assert_eq!(
            game.flag(Color::WHITE),
            Some(GameResult::draw(ResultReason::INSUFFICIENT_MATERIAL_AND_TIMEOUT))
        );

        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        play(&mut game, &shuffle);
        play(&mut game, &shuffle);
        game.navigate_to(1);
        assert_eq!(game.repetitions(), 2);
        assert_eq!(
            game.claim_threefold(),
            Some(GameResult::draw(ResultReason::THREEFOLD_REPETITION))
        );
    }

    #[test]
    fn threefold_must_be_claimed() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        play(&mut game, &shuffle);
        assert_eq!(game.repetitions(), 2);
        assert!(game.claim_threefold().is_none());
        play(&mut game, &shuffle);
        assert_eq!(game.repetitions(), 3);
        assert!(game.result().is_none());
        assert_eq!(
            game.claim_threefold(),
            Some(GameResult::draw(ResultReason::THREEFOLD_REPETITION))
        );
    }

    #[test]
    fn resignation_draws_and_flags() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        assert_eq!(
            game.resign(Color::WHITE),
            Some(GameResult::win(Color::BLACK, ResultReason::RESIGNATION))
        );
        assert!(game.agree_draw().is_none());

        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        assert_eq!(
            game.flag(Color::BLACK),
            Some(GameResult::win(Color::WHITE, ResultReason::TIMEOUT))
        );

        let pos = parse_position("4k3/8/8/8/8/8/8/3QK3 w - - 0 1", VariantSet::STANDARD)
            .unwrap();
        let mut game = Game::new(pos);
        assert_eq!(
            game.flag(Color::WHITE),
            Some(GameResult::draw(ResultReason::INSUFFICIENT_MATERIAL_AND_TIMEOUT))
        );
    }

    #[test]
    fn clock_bookkeeping() {
        let mut game = Game::new(start_position(VariantSet::STANDARD, None));
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let moves = ["e2e4", "e7e5", "g1f3"];
        let times = [t0, t0 + TimeDelta::seconds(3), t0 + TimeDelta::seconds(10)];
        for (text, now) in moves.into_iter().zip(times) {
            let m = mv(&game, text);
            assert!(game.submit_at(m, now).is_some());
        }
        let records: Vec<_> = game.moves().collect();
        assert_eq!(records[0].duration_ms, None);
        assert_eq!(records[1].duration_ms, Some(3_000));
        assert_eq!(records[2].duration_ms, Some(7_000));
        assert_eq!(records[2].elapsed_ms, [7_000, 3_000]);
    }

    #[test]
    fn dark_chess_history() {
        let dark = VariantSet::STANDARD.with(Variant::DARK_CHESS);
        let mut game = Game::new(start_position(dark, None));
        play(&mut game, &["e2e4", "h7h6"]);

        let seen = game.visibility_at(0, Color::WHITE);
        assert!(!seen.contains(&Square::at(4, 4)));
        let seen = game.visibility_at(1, Color::WHITE);
        assert!(seen.contains(&Square::at(4, 4)));
        assert_eq!(game.cursor(), 2);

        let hidden = game.redacted_move(1, Color::WHITE);
        assert_eq!(hidden.to, None);
        let shown = game.redacted_move(0, Color::WHITE);
        assert_eq!(shown.to, Some(Square::at(4, 3)));
    }
}
