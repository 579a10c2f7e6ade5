//! Legality, clocks, termination and winner rules.

use std::time::Duration;

use voronoi_game::{
    Board, Cell, Ending, Game, GameConfig, GameState, MoveError, MoveValidator, PlayerId,
    Proposal, Score, Stone, TurnOutcome, Violation, distance, winners,
};

fn p(id: u8) -> PlayerId {
    PlayerId::new(id).expect("non-zero id")
}

#[test]
fn test_negative_row_always_out_of_bounds() {
    let validator = MoveValidator::new(20, 0.0);
    let empty = Board::new(20);
    assert!(matches!(
        validator.check(Proposal::new(-1, 5), &empty, &[]),
        Err(MoveError::OutOfBounds { .. })
    ));

    let config = GameConfig::new(2, 3).with_grid_size(20).with_min_dist(0.0);
    let mut game = Game::new(config).unwrap();
    game.apply(Proposal::new(4, 4), Duration::ZERO).unwrap();
    let outcome = game.apply(Proposal::new(-1, 5), Duration::ZERO).unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Rejected(player, Violation::Illegal(MoveError::OutOfBounds { .. }))
            if player == p(2)
    ));
    assert_eq!(game.scores()[1], Score::IllegalMove);
    assert_eq!(game.scores()[1].wire_value(), -1);
    assert_eq!(game.state(), GameState::Terminated);
}

#[test]
fn test_min_dist_boundary_is_inclusive() {
    let config = GameConfig::new(2, 2).with_grid_size(1000).with_min_dist(66.0);
    let mut game = Game::new(config.clone()).unwrap();
    game.apply(Proposal::new(0, 0), Duration::ZERO).unwrap();

    // Exactly 66.0 units away.
    let outcome = game.apply(Proposal::new(0, 66), Duration::ZERO).unwrap();
    assert!(matches!(outcome, TurnOutcome::Continue(_)));

    // 65.05 units from the first stone.
    let outcome = game.apply(Proposal::new(46, 46), Duration::ZERO).unwrap();
    match outcome {
        TurnOutcome::Rejected(player, Violation::Illegal(MoveError::TooClose { distance, .. })) => {
            assert_eq!(player, p(1));
            assert!(distance < 65.9);
        }
        other => panic!("Expected TooClose rejection, got {other:?}"),
    }

    let mut game = Game::new(config).unwrap();
    game.apply(Proposal::new(500, 500), Duration::ZERO).unwrap();
    let outcome = game.apply(Proposal::new(500, 565), Duration::ZERO).unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Rejected(_, Violation::Illegal(MoveError::TooClose { .. }))
    ));
}

#[test]
fn test_proximity_rejection_is_owner_agnostic() {
    let min_dist = 4.0;
    let history = [
        Stone::new(Cell::new(3, 3), p(1), 0),
        Stone::new(Cell::new(10, 12), p(2), 1),
        Stone::new(Cell::new(14, 2), p(3), 2),
    ];
    let mut board = Board::new(16);
    for stone in &history {
        board.place(stone).unwrap();
    }
    let validator = MoveValidator::new(16, min_dist);

    for row in 0..16 {
        for col in 0..16 {
            let cell = Cell::new(row, col);
            let nearest = history
                .iter()
                .map(|s| distance(cell, s.cell))
                .fold(f64::INFINITY, f64::min);
            match validator.check(Proposal::new(row as i64, col as i64), &board, &history) {
                Err(MoveError::TooClose { stone, distance: d, .. }) => {
                    assert!(d < min_dist);
                    assert_eq!(d, distance(cell, stone.cell));
                }
                Err(MoveError::Occupied { .. }) => assert_eq!(nearest, 0.0),
                Err(other) => panic!("unexpected {other}"),
                Ok(_) => assert!(nearest >= min_dist),
            }
        }
    }
}

#[test]
fn test_overrun_clock_scores_timeout() {
    let config = GameConfig::new(2, 5)
        .with_grid_size(10)
        .with_min_dist(0.0)
        .with_time_budget_secs(1.0);
    let mut game = Game::new(config).unwrap();

    let outcome = game
        .apply(Proposal::new(2, 2), Duration::from_millis(1010))
        .unwrap();

    assert!((game.clock().remaining(p(1)) + 0.01).abs() < 1e-9);
    assert_eq!(
        outcome,
        TurnOutcome::Final(Stone::new(Cell::new(2, 2), p(1), 0), Ending::Timeout(p(1)))
    );
    assert_eq!(game.scores()[0], Score::Timeout);
    assert_eq!(game.scores()[0].wire_value(), -2);
    assert_eq!(game.state(), GameState::Terminated);
    // The stone itself stays on the board.
    assert_eq!(game.board().stone_at(Cell::new(2, 2)), Some(p(1)));
}

#[test]
fn test_exact_budget_is_not_overrun() {
    let config = GameConfig::new(2, 5)
        .with_grid_size(10)
        .with_min_dist(0.0)
        .with_time_budget_secs(1.0);
    let mut game = Game::new(config).unwrap();
    let outcome = game.apply(Proposal::new(2, 2), Duration::from_secs(1)).unwrap();
    assert!(matches!(outcome, TurnOutcome::Continue(_)));
}

#[test]
fn test_three_way_tie_reports_every_winner() {
    let scores = [Score::Cells(120), Score::Cells(120), Score::Cells(120)];
    assert_eq!(winners(&scores), vec![p(1), p(2), p(3)]);

    let scores = [
        Score::Cells(50),
        Score::Cells(80),
        Score::Timeout,
        Score::Cells(80),
        Score::Cells(80),
    ];
    assert_eq!(winners(&scores), vec![p(2), p(4), p(5)]);
}

#[test]
fn test_illegal_move_ends_whole_game() {
    let config = GameConfig::new(3, 3).with_grid_size(10).with_min_dist(0.0);
    let mut game = Game::new(config).unwrap();
    game.apply(Proposal::new(0, 0), Duration::ZERO).unwrap();
    game.apply(Proposal::new(0, 0), Duration::ZERO).unwrap();

    assert!(game.is_terminated());
    assert_eq!(
        game.scores(),
        &[Score::Cells(100), Score::IllegalMove, Score::Cells(0)]
    );
    assert_eq!(game.winners(), vec![p(1)]);

    let message = game.turn_message();
    assert!(message.game_over);
    assert_eq!(message.to_string(), "1 3 100 -1 0 1 0 0 1");
}

#[test]
fn test_turn_message_carries_moves_since_last_turn() {
    let config = GameConfig::new(3, 2).with_grid_size(10).with_min_dist(0.0);
    let mut game = Game::new(config).unwrap();

    assert_eq!(game.turn_message().to_string(), "0 3 0 0 0 0");

    for (row, col) in [(0, 0), (9, 9), (5, 5)] {
        game.apply(Proposal::new(row, col), Duration::ZERO).unwrap();
    }

    // Player 1 is up again and sees players 2 and 3's stones only.
    let message = game.turn_message();
    assert_eq!(game.current_player(), p(1));
    let cells: Vec<Cell> = message.moves.iter().map(|m| m.cell).collect();
    assert_eq!(cells, vec![Cell::new(9, 9), Cell::new(5, 5)]);
}
