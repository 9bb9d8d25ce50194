mod gamelog;

use std::{fs, path::Path};

use minegrid::{
    action::Action,
    agent::{self, GameStatus},
    board::Board,
    grid::GridSize,
    seeder::CountSeeder,
};
use rand::{rngs::StdRng, seq::IteratorRandom, SeedableRng};

const ROWS: usize = 16;
const COLS: usize = 30;
const MINES: usize = 99;
const FORGIVENESS: usize = 0;
/// Redeal the board around the opening move so the first select never loses.
const GOOD_FIRST_SELECT: bool = true;
const GAMES: usize = 10;
const AGENT: &str = "rules";
const RUNS_DIR: &str = "runs";

fn main() -> std::io::Result<()> {
    let size = GridSize::new(ROWS, COLS).expect("board dimensions are nonzero");
    let seeder = CountSeeder::new(MINES);
    let mut rng = StdRng::from_entropy();

    fs::create_dir_all(RUNS_DIR)?;
    let runs = Path::new(RUNS_DIR);
    let mut game_number = gamelog::next_game_number(runs, AGENT)?;

    let mut won = 0;
    for _ in 0..GAMES {
        let mut board =
            Board::new(size, &seeder, FORGIVENESS, &mut rng).expect("mine count fits the board");
        let mut agent = agent::create(AGENT)
            .unwrap_or_else(|| panic!("no agent registered under {AGENT:?}"));
        agent.start(size);

        if GOOD_FIRST_SELECT {
            let opening = size
                .positions()
                .choose(&mut rng)
                .expect("a nonzero grid has positions");
            board
                .first_select(opening, &mut rng)
                .expect("first select on a fresh board");
        }

        let mut surrendered = false;
        while !board.completed() && !board.failed() && !surrendered {
            let actions = agent.act(&board.snapshot());
            if actions.is_empty() {
                break;
            }
            for action in actions {
                match action {
                    Action::Select(pos) => board.select(pos).expect("agent selects on the grid"),
                    Action::Flag(pos) => board.toggle_flag(pos).expect("agent flags on the grid"),
                    Action::Chord(pos) => board.chord(pos).expect("agent chords on the grid"),
                    Action::Superchord => board.superchord(),
                    Action::Surrender => surrendered = true,
                }
            }
            agent.react(GameStatus {
                completed: board.completed(),
                failed: board.failed(),
                flags: board.flags(),
                open_cells: board.open_cells(),
                open_mines: board.open_mines(),
            });
        }

        let verdict = if board.completed() && !board.failed() {
            won += 1;
            "won"
        } else if surrendered {
            "surrendered"
        } else {
            "lost"
        };
        println!("{board}");
        println!(
            "game {game_number}: {verdict} ({} open, {} flags, {} open mines)",
            board.open_cells(),
            board.flags(),
            board.open_mines(),
        );

        gamelog::save_layouts(runs, AGENT, game_number, &board.layouts())?;
        game_number += 1;
    }

    println!("{won}/{GAMES} games won by {AGENT}");
    Ok(())
}
