//! Perft integration tests: move generation and make/unmake correctness checked against known
//! leaf counts for a handful of standard reference positions.

use corvid::eval::StandardTables;
use corvid::perft::perft;
use corvid::position::Position;

fn perft_at(fen: &str, depths_and_counts: &[(u32, u64)]) {
    let mut pos = Position::from_fen(fen, &StandardTables).unwrap();
    for &(depth, want) in depths_and_counts {
        assert_eq!(perft(&mut pos, depth), want, "fen {fen} depth {depth}");
    }
}

#[test]
fn startpos() {
    perft_at(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[(1, 20), (2, 400), (3, 8902), (4, 197_281)],
    );
}

#[test]
fn kiwipete() {
    perft_at(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[(1, 48), (2, 2039), (3, 97_862)],
    );
}

/// "Position 3" from the standard perft reference set — exercises en passant and checks heavily.
#[test]
fn position_3() {
    perft_at("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &[(1, 14), (2, 191), (3, 2812), (4, 43_238)]);
}

/// "Position 4" — exercises castling rights loss through rook capture and promotions.
#[test]
fn position_4() {
    perft_at(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[(1, 6), (2, 264), (3, 9467), (4, 422_333)],
    );
}

/// "Position 5" — a position with a discovered-check pin interaction.
#[test]
fn position_5() {
    perft_at("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", &[(1, 44), (2, 1486), (3, 62_379)]);
}

#[test]
fn divide_sums_to_perft_total() {
    let mut pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", &StandardTables).unwrap();
    let rows = corvid::perft::divide(&mut pos, 4);
    let sum: u64 = rows.iter().map(|&(_, n)| n).sum();
    assert_eq!(sum, perft(&mut pos, 4));
}
