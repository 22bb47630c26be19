use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, Subcommand};
#[cfg(feature = "perft")]
use kibitzer::game::perft::PerftConfig;
use kibitzer::{
    eval::{
        engine::{EngineConfig, UciEngine},
        service::EvaluationService,
        EvaluationOptions, DEFAULT_DEPTH,
    },
    game::{
        movegen::GameStatus,
        moves::Move,
        position::Position,
        score::Score,
        square::Square,
        state::{GameState, Notation},
    },
};

/// Centipawn value at which the evaluation bar is full.
const BAR_CLAMP: i32 = 1000;
const BAR_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plays through a game in the terminal, with engine evaluations (DEFAULT)
    Play {
        /// UCI engine to evaluate positions with
        #[arg(long, default_value = "stockfish")]
        engine: PathBuf,
        /// Strength of the engine, sent as its `Skill Level` option
        #[arg(long, default_value_t = 15)]
        skill_level: u8,
        /// Search depth of each evaluation
        #[arg(long, default_value_t = DEFAULT_DEPTH)]
        depth: u8,
        /// Time the engine is given to answer, in milliseconds
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
        /// Starting position as a FEN string
        #[arg(long)]
        fen: Option<String>,
    },
    /// Runs perft (generating all moves up to a certain depth)
    Perft {
        /// Maximum depth to reach
        depth: u8,
        /// Starting position as a FEN string.
        #[arg(short, long)]
        position: Option<String>,
        /// Shows move count for each move from the starting position
        #[arg(short)]
        divide: bool,
        /// Generates moves for each depth up to the maximum
        #[arg(short)]
        iterative: bool,
        /// Show timing information
        #[arg(long)]
        bench: bool,
        /// Does not show the board
        #[arg(long)]
        no_board: bool,
    },
}

pub fn main() {
    let args = Arguments::parse();
    env_logger::init();

    let command = args.command.unwrap_or(Command::Play {
        engine: PathBuf::from("stockfish"),
        skill_level: 15,
        depth: DEFAULT_DEPTH,
        timeout_ms: 5000,
        fen: None,
    });
    match command {
        Command::Play {
            engine,
            skill_level,
            depth,
            timeout_ms,
            fen,
        } => {
            let game = match fen.as_deref().map(GameState::from_fen).transpose() {
                Ok(game) => game.unwrap_or_default(),
                Err(e) => {
                    eprintln!("Invalid FEN: {e}");
                    std::process::exit(1)
                }
            };
            let config = EngineConfig::new(engine).with_timeout(Duration::from_millis(timeout_ms));
            let options = EvaluationOptions::new()
                .with_skill_level(skill_level)
                .with_depth(depth);
            let timeout = config.timeout;
            let mut session = Session {
                game,
                evaluations: EvaluationService::spawn(UciEngine::new(config)),
                options,
                timeout,
                score: Score::Unavailable,
            };
            if let Err(e) = session.run(io::stdin().lock(), io::stdout()) {
                eprintln!("{e}");
                std::process::exit(1)
            }
        }
        #[cfg(feature = "perft")]
        Command::Perft {
            position,
            depth,
            divide,
            iterative,
            bench,
            no_board,
        } => {
            let position = match position.as_deref().map(str::parse::<Position>).transpose() {
                Ok(position) => position.unwrap_or_else(Position::initial),
                Err(e) => {
                    eprintln!("Invalid FEN: {e}");
                    std::process::exit(1)
                }
            };

            PerftConfig::default()
                .with_depth(depth)
                .divide_moves(divide)
                .iterative_deepening(iterative)
                .benchmark(bench)
                .show_board(!no_board)
                .go(&position);
        }
        #[cfg(not(feature = "perft"))]
        Command::Perft { .. } => {
            eprintln!("Kibitzer has not been compiled with feature `perft`");
        }
    }
}

/// Text front end over a game.
struct Session {
    game: GameState,
    evaluations: EvaluationService,
    options: EvaluationOptions,
    timeout: Duration,
    score: Score,
}
impl Session {
    fn run(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        writeln!(output, "{}", HELP)?;
        self.position_changed();
        self.show_board(&mut output)?;

        for line in input.lines() {
            let line = line?;
            let mut words = line.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            match command {
                "quit" | "exit" => break,
                "help" => writeln!(output, "{HELP}")?,
                "board" => self.show_board(&mut output)?,
                "fen" => writeln!(output, "{}", self.game.position().fen())?,
                "history" => writeln!(output, "{}", self.game.move_list(Notation::San))?,
                "moves" => match words.next().map(str::parse::<Square>) {
                    Some(Ok(square)) => {
                        let targets: Vec<String> = self
                            .game
                            .legal_targets(square)
                            .iter()
                            .map(ToString::to_string)
                            .collect();
                        writeln!(output, "{square}: {}", targets.join(" "))?
                    }
                    Some(Err(e)) => writeln!(output, "{e}")?,
                    None => {
                        let moves: Vec<String> =
                            self.game.legal_moves().iter().map(ToString::to_string).collect();
                        writeln!(output, "{}", moves.join(" "))?
                    }
                },
                "undo" => match self.game.undo() {
                    Ok(mv) => {
                        writeln!(output, "took back {mv}")?;
                        self.position_changed();
                        self.show_board(&mut output)?
                    }
                    Err(e) => writeln!(output, "{e}")?,
                },
                "redo" => match self.game.redo() {
                    Ok(mv) => {
                        writeln!(output, "replayed {mv}")?;
                        self.position_changed();
                        self.show_board(&mut output)?
                    }
                    Err(e) => writeln!(output, "{e}")?,
                },
                "eval" => {
                    if !self.score.is_available() && !self.game.status().is_over() {
                        if let Some(score) =
                            self.evaluations.wait_for(self.game.position(), self.timeout)
                        {
                            self.score = score
                        }
                    }
                    writeln!(output, "{}", eval_line(self.score))?
                }
                mv => match mv.parse::<Move>() {
                    Ok(mv) => match self.game.apply_move(mv) {
                        Ok(applied) => {
                            writeln!(output, "played {}", applied.san)?;
                            self.position_changed();
                            self.show_board(&mut output)?
                        }
                        Err(e) if self.game.needs_promotion(mv.from, mv.to) => {
                            writeln!(output, "{e}: choose a promotion, e.g. {mv}q")?
                        }
                        Err(e) => writeln!(output, "{e}")?,
                    },
                    Err(_) => writeln!(output, "unknown command `{line}`, try `help`")?,
                },
            }
        }
        Ok(())
    }

    /// Asks for an evaluation of the new position, unless the game is over.
    fn position_changed(&mut self) {
        self.score = Score::Unavailable;
        if !self.game.status().is_over() {
            self.evaluations.request(self.game.position(), self.options)
        }
    }

    fn show_board(&mut self, output: &mut impl Write) -> io::Result<()> {
        if let Some(score) = self.evaluations.poll(self.game.position()) {
            self.score = score
        }
        let position = self.game.position();
        write!(output, "\n{position}")?;
        if let Some(last) = self.game.last_move() {
            writeln!(output, "last move: {last}")?
        }
        match self.game.status() {
            GameStatus::Ongoing => {
                let check = if position.in_check() { ", in check" } else { "" };
                writeln!(output, "{} to move{check}", position.side_to_move())?
            }
            GameStatus::Checkmate => writeln!(
                output,
                "Checkmate, {} wins",
                position.side_to_move().inverse()
            )?,
            GameStatus::Stalemate => writeln!(output, "Stalemate")?,
        }
        writeln!(output, "{}", eval_line(self.score))
    }
}

const HELP: &str = "commands: <move> (e.g. e2e4, e7e8q), moves [square], undo, redo, board, fen, history, eval, help, quit";

/// Renders a score as an evaluation bar, White's share on the left.
fn eval_line(score: Score) -> String {
    let white = (score.bar_fraction(BAR_CLAMP) * BAR_WIDTH as f32).round() as usize;
    let description = match score {
        Score::Centipawns(cp) => format!("Evaluation: {:.2} (centipawns {cp})", cp as f32 / 100.),
        Score::MateIn(n) => format!("Mate in {} moves for {}", n.abs(), if n < 0 { "Black" } else { "White" }),
        Score::Unavailable => "Evaluation: unavailable".to_string(),
    };
    format!(
        "[{}{}] {description}",
        "#".repeat(white),
        ".".repeat(BAR_WIDTH - white.min(BAR_WIDTH))
    )
}
