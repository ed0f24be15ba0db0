use chessmix::model::game::Game;
use chessmix::model::legality::{in_check, is_capture, legal_moves};
use chessmix::model::moving::{make_move, unmake_move};
use chessmix::model::outcome::{GameResult, ResultReason};
use chessmix::model::setup::start_position;
use chessmix::model::variants::{Variant, VariantSet};
use chessmix::model::{Color, Location, PieceType, Square};
use chessmix::notation::fen::{Snapshot, parse_position, write_position};
use chessmix::notation::san::find_san;

fn variants(list: &[Variant]) -> VariantSet {
    list.iter().copied().collect()
}

fn play(game: &mut Game, sans: &[&str]) {
    for san in sans {
        let mv = find_san(game.position(), san)
            .unwrap_or_else(|| panic!("{san} is not legal in {}", write_position(game.position())));
        assert!(game.submit(mv).is_some(), "{san}");
    }
}

#[test]
fn atomic_knight_raid_explodes_the_white_king() {
    let pos = parse_position(
        "rnbqkb1r/pppppppp/8/1N6/4n3/8/PPPPPPPP/R1BQKBNR w KQkq - 4 3",
        variants(&[Variant::ATOMIC]),
    )
    .unwrap();
    let mut game = Game::new(pos);

    play(&mut game, &["Nxc7"]);
    let pos = game.position();
    for sq in [(1, 4), (2, 6), (1, 7), (2, 7), (3, 7)] {
        assert!(pos.is_empty(Square::at(sq.0, sq.1)), "{sq:?}");
    }
    assert_eq!(pos.at(Square::at(4, 7)).map(|p| p.kind), Some(PieceType::KING));
    assert_eq!(pos.at(Square::at(1, 6)).map(|p| p.kind), Some(PieceType::PAWN));
    assert_eq!(game.result(), None);

    play(&mut game, &["Nxd2"]);
    assert_eq!(
        game.result(),
        Some(GameResult::win(Color::BLACK, ResultReason::KING_EXPLODED))
    );
    assert!(game.position().royals(Color::WHITE).next().is_none());
}

#[test]
fn crazyhouse_drop_from_the_pocket() {
    let mut game = Game::new(start_position(variants(&[Variant::CRAZYHOUSE]), None));
    play(&mut game, &["e4", "d5", "exd5", "Qxd5", "Nf3"]);

    let pos = game.position();
    assert_eq!(
        pos.pocket(Color::BLACK).map(|p| p.kind).collect::<Vec<_>>(),
        [PieceType::PAWN]
    );
    assert!(find_san(pos, "P@c1").is_none());
    assert!(find_san(pos, "P@d5").is_none());
    assert!(find_san(pos, "N@c4").is_none());

    play(&mut game, &["P@c4"]);
    let pos = game.position();
    let pawn = pos.at(Square::at(2, 3)).unwrap();
    assert_eq!((pawn.kind, pawn.color), (PieceType::PAWN, Color::BLACK));
    assert_eq!(pos.pocket(Color::BLACK).count(), 0);
    assert_eq!(game.last_move().map(|m| m.san.as_str()), Some("P@c4"));
}

#[test]
fn crazyhouse_promoted_pieces_return_as_pawns() {
    let pos = parse_position(
        "4k2r/8/8/8/8/8/8/4K2Q~ b - - 0 1",
        variants(&[Variant::CRAZYHOUSE]),
    )
    .unwrap();
    let mut game = Game::new(pos);
    play(&mut game, &["Rxh1+"]);
    let pocket: Vec<_> = game.position().pocket(Color::BLACK).map(|p| p.kind).collect();
    assert_eq!(pocket, [PieceType::PAWN]);
}

#[test]
fn king_reaching_the_hill_wins() {
    let pos = parse_position(
        "4k3/p7/8/8/8/3K4/8/8 w - - 0 1",
        variants(&[Variant::KING_OF_THE_HILL]),
    )
    .unwrap();
    let mut game = Game::new(pos);
    play(&mut game, &["Kd4"]);
    assert_eq!(
        game.result(),
        Some(GameResult::win(Color::WHITE, ResultReason::KING_IN_THE_CENTER))
    );
}

#[test]
fn circe_rebirth_needs_an_empty_home() {
    let mut game = Game::new(start_position(variants(&[Variant::CIRCE]), None));
    play(&mut game, &["e4", "d5", "exd5"]);
    let pos = game.position();
    let reborn = pos.at(Square::at(3, 6)).unwrap();
    assert_eq!((reborn.kind, reborn.color), (PieceType::PAWN, Color::BLACK));
    assert!(!reborn.moved);

    // The white pawn dies on the d-file, where its own d-pawn still stands.
    play(&mut game, &["Nf6", "Nc3", "Nxd5"]);
    let pos = game.position();
    assert_eq!(pos.dead().count(), 1);
    assert_eq!(pos.on_board(Color::WHITE).count(), 15);
}

#[test]
fn madrasi_bishops_freeze_each_other() {
    let pos = parse_position(
        "K3k3/8/8/3b4/8/5B2/8/8 w - - 0 1",
        variants(&[Variant::MADRASI]),
    )
    .unwrap();
    let bishop = Square::at(5, 2);
    assert!(legal_moves(&pos).iter().all(|m| m.from_square() != Some(bishop)));
    assert!(!in_check(&pos, Color::WHITE));

    let plain = parse_position("K3k3/8/8/3b4/8/5B2/8/8 w - - 0 1", VariantSet::STANDARD).unwrap();
    assert!(in_check(&plain, Color::WHITE));
}

#[test]
fn alice_moves_change_boards() {
    let mut game = Game::new(start_position(variants(&[Variant::ALICE_CHESS]), None));
    play(&mut game, &["e4"]);
    let pos = game.position();
    assert!(pos.is_empty(Square::at(4, 3)));
    assert_eq!(
        pos.at(Square::new(1, 4, 3)).map(|p| p.kind),
        Some(PieceType::PAWN)
    );
}

#[test]
fn every_move_reverts_under_every_mutator() {
    for set in [
        variants(&[Variant::ATOMIC]),
        variants(&[Variant::CIRCE]),
        variants(&[Variant::CRAZYHOUSE]),
        variants(&[Variant::ABSORPTION]),
        variants(&[Variant::FRANKFURT]),
        variants(&[Variant::BENEDICT]),
        variants(&[Variant::ALICE_CHESS]),
        variants(&[Variant::COMPENSATION]),
        variants(&[Variant::MONSTER]),
        variants(&[Variant::ATOMIC, Variant::CIRCE, Variant::THREE_CHECK]),
    ] {
        let mut pos = start_position(set, None);
        for _ in 0..16 {
            let moves = legal_moves(&pos);
            let mut scratch = pos.clone();
            for &mv in &moves {
                let (patch, _) = make_move(&mut scratch, mv);
                assert!(scratch.is_consistent(), "{set} {mv:?}");
                unmake_move(&mut scratch, patch);
                assert_eq!(scratch, pos, "{set} {mv:?}");
            }
            let Some(&next) = moves
                .iter()
                .find(|&&mv| is_capture(&pos, mv))
                .or_else(|| moves.get(moves.len() / 2))
            else {
                break;
            };
            make_move(&mut pos, next);
        }
    }
}

#[test]
fn snapshots_survive_the_wire() {
    let set = variants(&[Variant::CRAZYHOUSE, Variant::THREE_CHECK]);
    let mut game = Game::new(start_position(set, None));
    play(&mut game, &["e4", "d5", "exd5", "Qxd5", "Nc3", "Qe5+"]);

    let snapshot = Snapshot::of(game.position());
    let text = serde_json::to_string(&snapshot).unwrap();
    let back: Snapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(back, snapshot);

    let pos = back.position().unwrap();
    assert_eq!(write_position(&pos), snapshot.fen);
    assert_eq!(pos.state().checks, [0, 1]);
    assert!(
        pos.pieces()
            .any(|p| p.location == Some(Location::Pocket(Color::WHITE)))
    );
}

#[test]
fn navigation_matches_the_recorded_positions() {
    let mut game = Game::new(start_position(variants(&[Variant::ATOMIC]), None));
    play(&mut game, &["e4", "d5", "exd5", "Qd6", "Nf3", "Qa3", "bxa3"]);
    let fens: Vec<_> = (0..=game.len())
        .map(|ply| write_position(&game.position_at(ply)))
        .collect();

    for ply in (0..=game.len()).rev() {
        game.navigate_to(ply);
        assert_eq!(write_position(game.position()), fens[ply]);
    }
    for ply in 0..=game.len() {
        game.navigate_to(ply);
        assert_eq!(write_position(game.position()), fens[ply]);
    }
}
