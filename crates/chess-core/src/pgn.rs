//! PGN import: strict mainline parse with one whitespace-collapsing retry.

use std::io::Cursor;
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};

use crate::error::ImportError;
use crate::game_data::{GameHeader, LoadedGame, Orientation};
use crate::replay::Replay;

/// Tags collected during header parsing.
#[derive(Default)]
struct PgnTags {
    white: Option<String>,
    black: Option<String>,
    white_elo: Option<String>,
    black_elo: Option<String>,
    result: Option<String>,
    event: Option<String>,
    site: Option<String>,
    date: Option<String>,
    fen: Option<String>,
    count: usize,
}

impl PgnTags {
    fn into_header(self) -> GameHeader {
        let defaults = GameHeader::imported();
        GameHeader {
            white: self.white.unwrap_or(defaults.white),
            black: self.black.unwrap_or(defaults.black),
            white_elo: self.white_elo.unwrap_or(defaults.white_elo),
            black_elo: self.black_elo.unwrap_or(defaults.black_elo),
            result: self.result.unwrap_or(defaults.result),
            event: self.event.unwrap_or(defaults.event),
            site: self.site.unwrap_or(defaults.site),
            date: self.date.unwrap_or(defaults.date),
        }
    }
}

/// State during movetext parsing.
struct MovetextState {
    tags: PgnTags,
    start_fen: String,
    replay: Replay,
    history: Vec<String>,
    /// First failure; later moves are ignored once set
    error: Option<ImportError>,
}

/// Visitor that validates every mainline move against the running position.
struct StrictGame;

impl Visitor for StrictGame {
    type Tags = PgnTags;
    type Movetext = MovetextState;
    type Output = Result<LoadedGame, ImportError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(PgnTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let value = value.decode_utf8_lossy().to_string();
        let slot = match name {
            b"White" => &mut tags.white,
            b"Black" => &mut tags.black,
            b"WhiteElo" => &mut tags.white_elo,
            b"BlackElo" => &mut tags.black_elo,
            b"Result" => &mut tags.result,
            b"Event" => &mut tags.event,
            b"Site" => &mut tags.site,
            b"Date" => &mut tags.date,
            b"FEN" => &mut tags.fen,
            _ => {
                tags.count += 1;
                return ControlFlow::Continue(());
            }
        };
        *slot = Some(value);
        tags.count += 1;
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let (replay, error) = match tags.fen.as_deref() {
            Some(fen) => match Replay::from_fen(fen) {
                Ok(replay) => (replay, None),
                Err(e) => (Replay::new(), Some(ImportError::from(e))),
            },
            None => (Replay::new(), None),
        };

        ControlFlow::Continue(MovetextState {
            tags,
            start_fen: replay.fen(),
            replay,
            history: Vec::new(),
            error,
        })
    }

    fn san(&mut self, state: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        if state.error.is_some() {
            return ControlFlow::Continue(());
        }

        let san = san_plus.to_string();
        match state.replay.play_san(&san) {
            Ok(played) => state.history.push(played.san),
            Err(e) => state.error = Some(ImportError::from(e)),
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _state: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true)) // mainline only
    }

    fn end_game(&mut self, state: Self::Movetext) -> Self::Output {
        if let Some(err) = state.error {
            return Err(err);
        }
        if state.tags.count == 0 && state.history.is_empty() {
            return Err(ImportError::UnparseableGame {
                reason: "no tags or moves found".to_string(),
            });
        }

        Ok(LoadedGame {
            fen: state.start_fen.clone(),
            start_fen: state.start_fen,
            history: state.history,
            move_index: None,
            orientation: Orientation::White,
            header: state.tags.into_header(),
        })
    }
}

/// Parse the first game of a PGN string.
///
/// A failed parse is retried once with all whitespace runs collapsed to a
/// single space (pasted PGNs often carry stray line breaks). If that also
/// fails, the error of the first attempt is reported.
pub fn load_pgn(pgn: &str) -> Result<LoadedGame, ImportError> {
    match parse_strict(pgn) {
        Ok(game) => Ok(game),
        Err(first) => {
            let collapsed = collapse_whitespace(pgn);
            parse_strict(&collapsed).map_err(|_| match first {
                ImportError::UnparseableGame { .. } => first,
                other => ImportError::UnparseableGame {
                    reason: other.to_string(),
                },
            })
        }
    }
}

fn parse_strict(pgn: &str) -> Result<LoadedGame, ImportError> {
    let mut reader = Reader::new(Cursor::new(pgn.as_bytes()));
    reader
        .read_game(&mut StrictGame)
        .map_err(|e| ImportError::UnparseableGame {
            reason: e.to_string(),
        })?
        .unwrap_or_else(|| {
            Err(ImportError::UnparseableGame {
                reason: "empty input".to_string(),
            })
        })
}

fn collapse_whitespace(pgn: &str) -> String {
    pgn.split_whitespace().collect::<Vec<_>>().join(" ")
}
