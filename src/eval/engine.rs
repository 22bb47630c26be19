//! # UCI engine client
//!
//! Drives an external engine process over UCI to evaluate positions. The engine
//! is started on the first evaluation, and restarted on the next one after any
//! failure.

use std::{
    collections::BTreeMap,
    io::{Read, Write},
    path::PathBuf,
    process::{Child, ChildStdin, Command, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{
    game::{position::Position, score::Score},
    uci::{
        commands::{UciCommand, UciInformation, UciMessage, UciParseError, UciSearchParameters},
        endpoint::{UciReader, UciWriter},
        options::{UciOption, UciOptionAssignError, UciValue},
    },
};

use super::{EvaluationOptions, Evaluator};

/// Name of the option engines use to weaken their play.
pub const SKILL_LEVEL_OPTION: &str = "Skill Level";
/// Time the engine is given to answer a command or finish a search.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How to start an engine.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub timeout: Duration,
}
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
impl EngineConfig {
    /// Configuration for the engine at `path`, with the default timeout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Everything that can go wrong while talking to an engine.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("failed to start engine {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to communicate with the engine: {0}")]
    Io(#[from] std::io::Error),
    #[error("the engine did not answer within {0:?}")]
    Timeout(Duration),
    #[error("the engine closed its output")]
    Disconnected,
    #[error("malformed engine output: {0}")]
    Protocol(#[from] UciParseError),
    #[error("invalid engine option: {0}")]
    InvalidOption(#[from] UciOptionAssignError),
    #[error("the engine finished searching without reporting a score")]
    NoScore,
}

type MessageReceiver = Receiver<Result<UciMessage, UciParseError>>;

/// Reads messages from an engine's output on a separate thread, so that
/// waiting for them can time out.
fn spawn_reader<R: Read + Send + 'static>(output: R) -> MessageReceiver {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = UciReader::new(output);
        while let Ok(Some(message)) = reader.read_message() {
            if sender.send(message).is_err() {
                break;
            }
        }
    });
    receiver
}

/// A conversation with an engine, over any output stream.
pub struct UciSession<W: Write> {
    writer: UciWriter<W>,
    messages: MessageReceiver,
    timeout: Duration,

    name: Option<String>,
    options: BTreeMap<String, UciOption>,
    skill_level: Option<i32>,
}
impl<W: Write> UciSession<W> {
    /// Creates a session sending commands to `output` and receiving the
    /// engine's messages from `messages`.
    pub fn new(output: W, messages: MessageReceiver, timeout: Duration) -> Self {
        Self {
            writer: UciWriter::new(output),
            messages,
            timeout,

            name: None,
            options: BTreeMap::new(),
            skill_level: None,
        }
    }

    /// Name the engine gave during the handshake.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns an option advertised by the engine.
    pub fn option(&self, name: &str) -> Option<&UciOption> {
        self.options.get(name)
    }

    fn send(&mut self, command: UciCommand) -> Result<(), EvaluatorError> {
        Ok(self.writer.send_command(&command)?)
    }

    /// Waits for the next meaningful message. Lines that are not UCI messages,
    /// such as the banner most engines print on startup, are skipped.
    fn receive(&mut self, deadline: Instant) -> Result<UciMessage, EvaluatorError> {
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.messages.recv_timeout(left) {
                Ok(Ok(message)) => return Ok(message),
                Ok(Err(UciParseError::EmptyInput)) => (),
                Ok(Err(UciParseError::UnknownMessage(line))) => {
                    log::debug!("ignoring engine output: {line}")
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(RecvTimeoutError::Timeout) => return Err(EvaluatorError::Timeout(self.timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(EvaluatorError::Disconnected),
            }
        }
    }

    /// Initializes the engine, records the options it advertises and starts a
    /// new game.
    ///
    /// Option lines that cannot be parsed are skipped, the engine stays usable
    /// without them.
    pub fn handshake(&mut self) -> Result<(), EvaluatorError> {
        self.send(UciCommand::Initialize)?;
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.receive(deadline) {
                Ok(UciMessage::IdName(name)) => self.name = Some(name),
                Ok(UciMessage::Option(option)) => {
                    self.options.insert(option.name.clone(), option);
                }
                Ok(UciMessage::Initialized) => break,
                Ok(_) => (),
                Err(EvaluatorError::Protocol(e)) => {
                    log::warn!("skipping malformed engine line during handshake: {e}")
                }
                Err(e) => return Err(e),
            }
        }
        self.send(UciCommand::NewGame)?;
        self.synchronize()
    }

    fn synchronize(&mut self) -> Result<(), EvaluatorError> {
        self.send(UciCommand::IsReady)?;
        let deadline = Instant::now() + self.timeout;
        while self.receive(deadline)? != UciMessage::Ready {}
        Ok(())
    }

    /// Sends the skill level if it changed, clamped into the range the engine
    /// advertised.
    fn configure(&mut self, options: &EvaluationOptions) -> Result<(), EvaluatorError> {
        let Some(requested) = options.skill_level else {
            return Ok(());
        };
        let Some(option) = self.options.get_mut(SKILL_LEVEL_OPTION) else {
            log::info!("the engine has no {SKILL_LEVEL_OPTION} option, ignoring it");
            return Ok(());
        };

        let level = option.value.clamp(requested as i32);
        if self.skill_level == Some(level) {
            return Ok(());
        }
        option.value.assign(UciValue::Integer(level))?;
        self.send(UciCommand::SetOption {
            name: SKILL_LEVEL_OPTION.to_string(),
            value: Some(UciValue::Integer(level)),
        })?;
        self.synchronize()?;
        self.skill_level = Some(level);
        Ok(())
    }

    /// Searches a position and returns the last score reported before the best
    /// move, from White's point of view.
    pub fn evaluate(
        &mut self,
        position: &Position,
        options: &EvaluationOptions,
    ) -> Result<Score, EvaluatorError> {
        self.configure(options)?;
        self.send(UciCommand::SetPosition {
            fen: Some(position.fen()),
            moves: Vec::new(),
        })?;
        self.send(UciCommand::StartSearch(
            UciSearchParameters::new().with_depth(options.depth),
        ))?;

        let deadline = Instant::now() + self.timeout;
        let mut score = None;
        loop {
            let message = match self.receive(deadline) {
                Err(EvaluatorError::Timeout(timeout)) => {
                    self.send(UciCommand::StopSearch)?;
                    return Err(EvaluatorError::Timeout(timeout));
                }
                message => message?,
            };
            if let UciMessage::SearchResult { .. } = message {
                break;
            }
            // Only the main line counts when the engine searches several.
            if message.multipv().unwrap_or(1) != 1 {
                continue;
            }
            match message.score() {
                Some(info) if info.is_exact_score() || score.is_none() => score = to_score(info),
                _ => (),
            }
        }

        let score = score.ok_or(EvaluatorError::NoScore)?;
        Ok(score.from_side_to_move(position.side_to_move()))
    }
}

fn to_score(info: &UciInformation) -> Option<Score> {
    match info {
        UciInformation::CentipawnScore { centipawns, .. } => Some(Score::Centipawns(*centipawns)),
        UciInformation::MateIn { moves, .. } => Some(Score::MateIn(*moves)),
        _ => None,
    }
}

/// A running engine process.
struct EngineProcess {
    child: Child,
    session: UciSession<ChildStdin>,
}
impl EngineProcess {
    fn spawn(config: &EngineConfig) -> Result<Self, EvaluatorError> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EvaluatorError::Spawn {
                path: config.path.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(EvaluatorError::Disconnected);
        };
        let mut process = Self {
            child,
            session: UciSession::new(stdin, spawn_reader(stdout), config.timeout),
        };
        process.session.handshake()?;
        log::info!(
            "started engine {} ({})",
            process.session.name().unwrap_or("unnamed"),
            config.path.display()
        );
        Ok(process)
    }
}
impl Drop for EngineProcess {
    fn drop(&mut self) {
        let _ = self.session.send(UciCommand::Quit);
        // The engine may already be gone after `quit`.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// An [`Evaluator`] backed by an external UCI engine.
pub struct UciEngine {
    config: EngineConfig,
    process: Option<EngineProcess>,
}
impl UciEngine {
    /// Creates an engine client. The process is started on the first
    /// evaluation.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            process: None,
        }
    }

    /// Starts the engine right away.
    /// # Errors
    /// Returns an error if the engine could not be started or did not complete
    /// the handshake in time.
    pub fn start(config: EngineConfig) -> Result<Self, EvaluatorError> {
        let process = EngineProcess::spawn(&config)?;
        Ok(Self {
            config,
            process: Some(process),
        })
    }

    /// Name of the running engine.
    pub fn name(&self) -> Option<&str> {
        self.process.as_ref().and_then(|p| p.session.name())
    }

    /// Evaluates a position, starting the engine first if needed.
    pub fn try_evaluate(
        &mut self,
        position: &Position,
        options: &EvaluationOptions,
    ) -> Result<Score, EvaluatorError> {
        let process = match self.process.take() {
            Some(process) => process,
            None => EngineProcess::spawn(&self.config)?,
        };
        self.process.insert(process).session.evaluate(position, options)
    }
}
impl Evaluator for UciEngine {
    fn evaluate(&mut self, position: &Position, options: &EvaluationOptions) -> Score {
        match self.try_evaluate(position, options) {
            Ok(score) => score,
            Err(e) => {
                log::warn!("evaluation unavailable: {e}");
                // The engine may be in any state now, start afresh next time.
                self.process = None;
                Score::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::mpsc::Sender;

    use super::*;
    use crate::game::fen::STARTING_FEN;

    const HANDSHAKE: &str = "Mock engine v1 by nobody
id name Mock
id author Nobody
option name Hash type spin default 16 min 1 max 1024
option name Skill Level type spin default 20 min 0 max 20
uciok
readyok
";

    type Feed = Sender<Result<UciMessage, UciParseError>>;

    fn session_with_feed(transcript: &str) -> (UciSession<Vec<u8>>, Feed) {
        let (sender, receiver) = mpsc::channel();
        for line in transcript.lines() {
            sender.send(line.parse()).unwrap();
        }
        let session = UciSession::new(Vec::new(), receiver, Duration::from_millis(50));
        (session, sender)
    }

    fn scripted(transcript: &str) -> UciSession<Vec<u8>> {
        session_with_feed(transcript).0
    }

    fn sent(session: &UciSession<Vec<u8>>) -> String {
        String::from_utf8_lossy(session.writer.get_ref()).into_owned()
    }

    #[test]
    fn handshake_discovers_options() {
        let mut session = scripted(HANDSHAKE);
        session.handshake().unwrap();
        assert_eq!(session.name(), Some("Mock"));
        assert!(session.option("Hash").is_some());
        assert!(session.option(SKILL_LEVEL_OPTION).is_some());
        assert_eq!(sent(&session), "uci\nucinewgame\nisready\n");
    }

    #[test]
    fn malformed_options_are_skipped() {
        let mut session = scripted(
            "id name Mock
option name Threads type spin default one min 1 max 512
option name Skill Level type spin default 20 min 0 max 20
uciok
readyok
",
        );
        session.handshake().unwrap();
        assert_eq!(session.name(), Some("Mock"));
        assert!(session.option("Threads").is_none());
        assert!(session.option(SKILL_LEVEL_OPTION).is_some());
    }

    #[test]
    fn evaluation_keeps_the_last_score() {
        let transcript = format!(
            "{HANDSHAKE}readyok
info depth 1 seldepth 1 multipv 1 score cp 10 nodes 20 pv e2e4
info depth 2 seldepth 2 multipv 1 score cp 35 nodes 80 pv e2e4 e7e5
bestmove e2e4 ponder e7e5
"
        );
        let mut session = scripted(&transcript);
        session.handshake().unwrap();
        let options = EvaluationOptions::new().with_skill_level(25);
        let score = session.evaluate(&Position::initial(), &options);
        assert_eq!(score.unwrap(), Score::Centipawns(35));
        assert_eq!(
            sent(&session),
            format!(
                "uci\nucinewgame\nisready\nsetoption name Skill Level value 20\nisready\nposition fen {STARTING_FEN}\ngo depth 15\n"
            )
        );
    }

    #[test]
    fn scores_are_flipped_when_black_is_to_move() {
        let position = Position::initial().after("e2e4".parse().unwrap());

        let mut session = scripted("info depth 10 score cp 35 pv e7e5\nbestmove e7e5\n");
        assert_eq!(
            session.evaluate(&position, &EvaluationOptions::default()).unwrap(),
            Score::Centipawns(-35)
        );

        let mut session = scripted("info depth 10 score mate 2 pv e7e5\nbestmove e7e5\n");
        assert_eq!(
            session.evaluate(&position, &EvaluationOptions::default()).unwrap(),
            Score::MateIn(-2)
        );
    }

    #[test]
    fn bounds_do_not_override_exact_scores() {
        let mut session = scripted(
            "info depth 9 score cp 20 pv e2e4
info depth 10 score cp 50 lowerbound pv e2e4
info depth 10 multipv 2 score cp -80 pv a2a3
bestmove e2e4
",
        );
        assert_eq!(
            session
                .evaluate(&Position::initial(), &EvaluationOptions::default())
                .unwrap(),
            Score::Centipawns(20)
        );
    }

    #[test]
    fn missing_scores_and_closed_engines() {
        let mut session = scripted("info depth 1 nodes 20\nbestmove e2e4\n");
        assert!(matches!(
            session.evaluate(&Position::initial(), &EvaluationOptions::default()),
            Err(EvaluatorError::NoScore)
        ));

        let mut session = scripted("info depth 1 score cp 3\n");
        assert!(matches!(
            session.evaluate(&Position::initial(), &EvaluationOptions::default()),
            Err(EvaluatorError::Disconnected)
        ));

        let mut session = scripted("info depth 1 score centipawns 3\n");
        assert!(matches!(
            session.evaluate(&Position::initial(), &EvaluationOptions::default()),
            Err(EvaluatorError::Protocol(_))
        ));
    }

    #[test]
    fn slow_searches_are_stopped() {
        let (mut session, _feed) = session_with_feed("info depth 1 score cp 3\n");
        assert!(matches!(
            session.evaluate(&Position::initial(), &EvaluationOptions::default()),
            Err(EvaluatorError::Timeout(_))
        ));
        assert!(sent(&session).ends_with("stop\n"));
    }

    #[test]
    fn missing_engine_is_unavailable() {
        let config = EngineConfig::new("/nonexistent/kibitzer-test-engine")
            .with_timeout(Duration::from_millis(50));
        assert!(matches!(
            UciEngine::start(config.clone()),
            Err(EvaluatorError::Spawn { .. })
        ));

        let mut engine = UciEngine::new(config);
        assert_eq!(
            engine.evaluate(&Position::initial(), &EvaluationOptions::default()),
            Score::Unavailable
        );
        assert_eq!(engine.name(), None);
    }
}
