//! # UCI Commands
//! [`UciCommand`]s are sent to a UCI compatible engine, which answers with
//! [`UciMessage`]s.

use std::{num::NonZeroU8, time::Duration};

use thiserror::Error;

use crate::game::{
    fen::Fen,
    moves::{Move, MoveParseError},
};

use super::options::{UciOption, UciValue};

/// Commands that can be sent to an engine.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum UciCommand {
    Initialize,
    IsReady,
    SetOption {
        name: String,
        value: Option<UciValue>,
    },
    NewGame,
    SetPosition {
        fen: Option<Fen>,
        moves: Vec<Move>,
    },
    StartSearch(UciSearchParameters),
    StopSearch,
    Quit,
}
impl std::fmt::Display for UciCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialize => writeln!(f, "uci"),
            Self::IsReady => writeln!(f, "isready"),
            Self::SetOption { name, value } => match value {
                Some(UciValue::Button) | None => writeln!(f, "setoption name {name}"),
                Some(value) => writeln!(f, "setoption name {name} value {value}"),
            },
            Self::NewGame => writeln!(f, "ucinewgame"),
            Self::SetPosition { fen, moves } => {
                match fen {
                    Some(fen) => write!(f, "position fen {fen}")?,
                    None => write!(f, "position startpos")?,
                }
                if !moves.is_empty() {
                    write!(f, " moves")?;
                    for mv in moves {
                        write!(f, " {mv}")?
                    }
                }
                writeln!(f)
            }
            Self::StartSearch(parameters) => writeln!(f, "go{parameters}"),
            Self::StopSearch => writeln!(f, "stop"),
            Self::Quit => writeln!(f, "quit"),
        }
    }
}

/// A builder to create clean parameters of search to send to the engine.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct UciSearchParameters {
    pub(crate) depth: Option<NonZeroU8>,
}
impl UciSearchParameters {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = NonZeroU8::new(depth);
        self
    }
}
impl std::fmt::Display for UciSearchParameters {
    /// Writes the parameters as the arguments of a `go` command, each one
    /// preceded by a space.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.depth {
            Some(depth) => write!(f, " depth {depth}"),
            None => Ok(()),
        }
    }
}

/// Errors raised when an engine output line cannot be understood.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum UciParseError {
    #[error("Empty line")]
    EmptyInput,
    #[error("Unknown message: {0}")]
    UnknownMessage(String),
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveParseError),
}

/// Messages sent by an engine in response to a command.
#[derive(Clone, PartialEq, Debug)]
pub enum UciMessage {
    IdName(String),
    IdAuthor(String),
    Initialized,
    Ready,
    /// Result of a search. Engines send `bestmove (none)` when there is no
    /// legal move to play.
    SearchResult {
        best: Option<Move>,
        ponder_on: Option<Move>,
    },
    Information(Vec<UciInformation>),
    Option(UciOption),
}
impl UciMessage {
    /// Returns the score carried by an `info` message, if any.
    pub fn score(&self) -> Option<&UciInformation> {
        match self {
            Self::Information(infos) => infos.iter().find(|info| {
                matches!(
                    info,
                    UciInformation::CentipawnScore { .. } | UciInformation::MateIn { .. }
                )
            }),
            _ => None,
        }
    }

    /// Returns the rank of the line an `info` message is about, when the
    /// engine searches several lines at once. Lines are ranked from 1.
    pub fn multipv(&self) -> Option<u8> {
        match self {
            Self::Information(infos) => infos.iter().find_map(|info| match info {
                UciInformation::PrincipalVariation { ranking, .. } => *ranking,
                _ => None,
            }),
            _ => None,
        }
    }
}
impl std::str::FromStr for UciMessage {
    type Err = UciParseError;

    /// Parses a line sent by an engine.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let rest = rest.trim_start();

        match verb {
            "" => Err(UciParseError::EmptyInput),
            "uciok" => Ok(Self::Initialized),
            "readyok" => Ok(Self::Ready),
            "id" => match rest.split_once(char::is_whitespace) {
                Some(("name", name)) => Ok(Self::IdName(name.trim().to_string())),
                Some(("author", author)) => Ok(Self::IdAuthor(author.trim().to_string())),
                _ => Err(UciParseError::UnexpectedToken(rest.to_string())),
            },
            "bestmove" => {
                let mut tokens = rest.split_whitespace();
                let best = match tokens.next() {
                    Some("(none)") | Some("0000") => None,
                    Some(mv) => Some(mv.parse()?),
                    None => return Err(UciParseError::MissingField("bestmove")),
                };
                let ponder_on = match (tokens.next(), tokens.next()) {
                    (Some("ponder"), Some(mv)) => Some(mv.parse()?),
                    _ => None,
                };
                Ok(Self::SearchResult { best, ponder_on })
            }
            "info" => parse_information(rest).map(Self::Information),
            "option" => UciOption::parse(rest).map(Self::Option),
            _ => Err(UciParseError::UnknownMessage(s.to_string())),
        }
    }
}

/// Whether a reported score is exact or a bound.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScoreBound {
    Lower,
    Upper,
}

/// Information that can be sent from the engine during a search.
#[derive(Clone, PartialEq, Debug)]
pub enum UciInformation {
    SearchDepth(u8),
    SelectiveDepth(u8),
    SearchTime(Duration),
    SearchedNodes(u64),
    PrincipalVariation {
        ranking: Option<u8>,
        moves: Vec<Move>,
    },
    /// Score relative to the side to move.
    CentipawnScore {
        centipawns: i32,
        bound: Option<ScoreBound>,
    },
    /// Mate in a number of moves, negative when the side to move gets mated.
    MateIn {
        moves: i32,
        bound: Option<ScoreBound>,
    },
    HashTableFill(f32),
    SearchSpeed(u64),
    Debug(String),
}
impl UciInformation {
    /// Checks if this is an exact score rather than a bound.
    pub fn is_exact_score(&self) -> bool {
        matches!(
            self,
            Self::CentipawnScore { bound: None, .. } | Self::MateIn { bound: None, .. }
        )
    }
}
impl std::fmt::Display for UciInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |bound: &Option<ScoreBound>| match bound {
            Some(ScoreBound::Lower) => " lowerbound",
            Some(ScoreBound::Upper) => " upperbound",
            None => "",
        };
        match self {
            Self::SearchDepth(depth) => write!(f, "depth {depth}"),
            Self::SelectiveDepth(depth) => write!(f, "seldepth {depth}"),
            Self::SearchTime(duration) => write!(f, "time {}", duration.as_millis()),
            Self::SearchedNodes(nodes) => write!(f, "nodes {nodes}"),
            Self::PrincipalVariation { ranking, moves } => {
                if let Some(ranking) = ranking {
                    write!(f, "multipv {ranking} ")?
                }
                write!(f, "pv")?;
                for mv in moves.iter() {
                    write!(f, " {mv}")?
                }
                Ok(())
            }
            Self::CentipawnScore {
                centipawns,
                bound: b,
            } => write!(f, "score cp {centipawns}{}", bound(b)),
            Self::MateIn { moves, bound: b } => write!(f, "score mate {moves}{}", bound(b)),
            Self::HashTableFill(fill) => write!(f, "hashfull {}", (fill * 1000.) as u16),
            Self::SearchSpeed(nps) => write!(f, "nps {nps}"),
            Self::Debug(msg) => write!(f, "string {msg}"),
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    token: Option<&str>,
) -> Result<T, UciParseError> {
    let token = token.ok_or(UciParseError::MissingField(field))?;
    token.parse().map_err(|_| UciParseError::InvalidValue {
        field,
        value: token.to_string(),
    })
}

/// Parses the body of an `info` line. Unknown fields are skipped along with
/// their value.
fn parse_information(s: &str) -> Result<Vec<UciInformation>, UciParseError> {
    let mut infos = Vec::new();
    let mut tokens = s.split_whitespace().peekable();
    let mut ranking = None;

    while let Some(token) = tokens.next() {
        match token {
            "depth" => infos.push(UciInformation::SearchDepth(parse_number(
                "depth",
                tokens.next(),
            )?)),
            "seldepth" => infos.push(UciInformation::SelectiveDepth(parse_number(
                "seldepth",
                tokens.next(),
            )?)),
            "time" => infos.push(UciInformation::SearchTime(Duration::from_millis(
                parse_number("time", tokens.next())?,
            ))),
            "nodes" => infos.push(UciInformation::SearchedNodes(parse_number(
                "nodes",
                tokens.next(),
            )?)),
            "nps" => infos.push(UciInformation::SearchSpeed(parse_number(
                "nps",
                tokens.next(),
            )?)),
            "hashfull" => infos.push(UciInformation::HashTableFill(
                parse_number::<u16>("hashfull", tokens.next())? as f32 / 1000.,
            )),
            "multipv" => ranking = Some(parse_number("multipv", tokens.next())?),
            "score" => {
                let kind = tokens.next().ok_or(UciParseError::MissingField("score"))?;
                let value: i32 = parse_number("score", tokens.next())?;
                let bound = match tokens.peek() {
                    Some(&"lowerbound") => Some(ScoreBound::Lower),
                    Some(&"upperbound") => Some(ScoreBound::Upper),
                    _ => None,
                };
                if bound.is_some() {
                    tokens.next();
                }
                infos.push(match kind {
                    "cp" => UciInformation::CentipawnScore {
                        centipawns: value,
                        bound,
                    },
                    "mate" => UciInformation::MateIn {
                        moves: value,
                        bound,
                    },
                    other => {
                        return Err(UciParseError::InvalidValue {
                            field: "score",
                            value: other.to_string(),
                        })
                    }
                })
            }
            // Both take the rest of the line.
            "pv" => {
                let moves = tokens
                    .by_ref()
                    .map(str::parse::<Move>)
                    .collect::<Result<Vec<Move>, _>>()?;
                infos.push(UciInformation::PrincipalVariation { ranking, moves })
            }
            "string" => {
                let msg = tokens.by_ref().collect::<Vec<_>>().join(" ");
                infos.push(UciInformation::Debug(msg))
            }
            "wdl" => {
                tokens.by_ref().take(3).for_each(drop);
            }
            _ => {
                // Fields such as `currmove` or `tbhits` carry a single value.
                tokens.next();
            }
        }
    }

    if let Some(ranking) = ranking {
        if !infos
            .iter()
            .any(|info| matches!(info, UciInformation::PrincipalVariation { .. }))
        {
            infos.push(UciInformation::PrincipalVariation {
                ranking: Some(ranking),
                moves: Vec::new(),
            })
        }
    }

    Ok(infos)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::fen::STARTING_FEN;

    #[test]
    fn commands_display() {
        assert_eq!(UciCommand::Initialize.to_string(), "uci\n");
        assert_eq!(UciCommand::NewGame.to_string(), "ucinewgame\n");
        assert_eq!(
            UciCommand::SetOption {
                name: "Skill Level".to_string(),
                value: Some(UciValue::Integer(15))
            }
            .to_string(),
            "setoption name Skill Level value 15\n"
        );
        assert_eq!(
            UciCommand::SetPosition {
                fen: Some(STARTING_FEN.parse().unwrap()),
                moves: vec![]
            }
            .to_string(),
            format!("position fen {STARTING_FEN}\n")
        );
        assert_eq!(
            UciCommand::SetPosition {
                fen: None,
                moves: vec!["e2e4".parse().unwrap(), "e7e5".parse().unwrap()]
            }
            .to_string(),
            "position startpos moves e2e4 e7e5\n"
        );
        assert_eq!(
            UciCommand::StartSearch(UciSearchParameters::new().with_depth(15)).to_string(),
            "go depth 15\n"
        );
    }

    #[test]
    fn handshake_messages() {
        assert_eq!(
            "id name Stockfish 16".parse(),
            Ok(UciMessage::IdName("Stockfish 16".to_string()))
        );
        assert_eq!("uciok\n".parse(), Ok(UciMessage::Initialized));
        assert_eq!("readyok".parse(), Ok(UciMessage::Ready));
        assert_eq!(
            "Stockfish 16 by the Stockfish developers".parse::<UciMessage>(),
            Err(UciParseError::UnknownMessage(
                "Stockfish 16 by the Stockfish developers".to_string()
            ))
        );
        assert!(matches!(
            "option name Hash type spin default 16 min 1 max 33554432".parse(),
            Ok(UciMessage::Option(UciOption { name, .. })) if name == "Hash"
        ));
    }

    #[test]
    fn search_results() {
        assert_eq!(
            "bestmove e2e4 ponder e7e5".parse(),
            Ok(UciMessage::SearchResult {
                best: Some("e2e4".parse().unwrap()),
                ponder_on: Some("e7e5".parse().unwrap())
            })
        );
        assert_eq!(
            "bestmove (none)".parse(),
            Ok(UciMessage::SearchResult {
                best: None,
                ponder_on: None
            })
        );
        assert!(matches!(
            "bestmove e9e4".parse::<UciMessage>(),
            Err(UciParseError::InvalidMove(_))
        ));
    }

    #[test]
    fn information_lines() {
        let info: UciMessage =
            "info depth 15 seldepth 20 multipv 1 score cp -35 nodes 1024 nps 512000 hashfull 12 tbhits 0 time 2 pv e7e5 g1f3"
                .parse()
                .unwrap();
        assert_eq!(
            info.score(),
            Some(&UciInformation::CentipawnScore {
                centipawns: -35,
                bound: None
            })
        );
        assert_eq!(info.multipv(), Some(1));
        let UciMessage::Information(infos) = info else {
            panic!("expected information")
        };
        assert!(infos.contains(&UciInformation::SearchDepth(15)));
        assert!(infos.contains(&UciInformation::SearchTime(Duration::from_millis(2))));
        assert!(infos.contains(&UciInformation::PrincipalVariation {
            ranking: Some(1),
            moves: vec!["e7e5".parse().unwrap(), "g1f3".parse().unwrap()]
        }));

        let mate: UciMessage = "info depth 3 score mate -2 upperbound pv".parse().unwrap();
        assert_eq!(
            mate.score(),
            Some(&UciInformation::MateIn {
                moves: -2,
                bound: Some(ScoreBound::Upper)
            })
        );
        assert!(!mate.score().is_some_and(UciInformation::is_exact_score));

        assert_eq!(
            "info string NNUE evaluation enabled".parse(),
            Ok(UciMessage::Information(vec![UciInformation::Debug(
                "NNUE evaluation enabled".to_string()
            )]))
        );
        assert!(matches!(
            "info score cp".parse::<UciMessage>(),
            Err(UciParseError::MissingField("score"))
        ));
    }
}
