//! Bidirectional traversal over a circular ticker list.
//!
//! The cursor always points at the ticker the *next* step would emit if the
//! direction does not change. Reversing direction steps two positions first so
//! the ticker just emitted is not emitted again:
//!
//! ```text
//! ring A B C D, cursor A
//! forward  -> A  (cursor B)
//! forward  -> B  (cursor C)
//! backward -> A  (cursor D)   two back from C, emit, one more back
//! forward  -> B  (cursor C)   two forward from D, emit, one more forward
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::{Ticker, ValidationError};

/// Last traversal direction taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Neutral,
    Forward,
    Backward,
}

/// Whether the last direction survives a ring rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirectionOnRebuild {
    /// Keep the direction; the next reversal still double-steps.
    #[default]
    Preserve,
    /// Return to [`Direction::Neutral`]; the next step emits the cursor ticker.
    Reset,
}

impl DirectionOnRebuild {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Reset => "reset",
        }
    }
}

impl Display for DirectionOnRebuild {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectionOnRebuild {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "reset" => Ok(Self::Reset),
            other => Err(ValidationError::InvalidPolicy {
                value: other.to_owned(),
                expected: "preserve, reset",
            }),
        }
    }
}

/// Circular sequence addressed by index. Neighbors wrap with modular arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ring {
    tickers: Vec<Ticker>,
}

impl Ring {
    pub fn new(tickers: Vec<Ticker>) -> Self {
        Self { tickers }
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn head(&self) -> Option<usize> {
        if self.tickers.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn get(&self, index: usize) -> Option<&Ticker> {
        self.tickers.get(index)
    }

    /// Index after `index`. Only meaningful on a non-empty ring.
    pub fn next(&self, index: usize) -> usize {
        (index + 1) % self.tickers.len()
    }

    /// Index before `index`. Only meaningful on a non-empty ring.
    pub fn prev(&self, index: usize) -> usize {
        (index + self.tickers.len() - 1) % self.tickers.len()
    }

    pub fn position(&self, ticker: &Ticker) -> Option<usize> {
        self.tickers.iter().position(|candidate| candidate == ticker)
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }
}

/// Ticker and search text for opening a new view on the last emitted ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenView {
    pub ticker: Ticker,
    pub query: String,
}

impl OpenView {
    fn for_ticker(ticker: Ticker) -> Self {
        let query = format!("{ticker} stock");
        Self { ticker, query }
    }

    /// `base` with the URL-encoded query appended, e.g. a search engine's `?q=`.
    pub fn search_url(&self, base: &str) -> String {
        format!("{base}{}", urlencoding::encode(&self.query))
    }
}

/// Ring plus traversal cursor.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    ring: Ring,
    cursor: Option<usize>,
    last: Direction,
    on_rebuild: DirectionOnRebuild,
}

impl Navigator {
    pub fn new(on_rebuild: DirectionOnRebuild) -> Self {
        Self {
            on_rebuild,
            ..Self::default()
        }
    }

    pub fn with_tickers(tickers: Vec<Ticker>, on_rebuild: DirectionOnRebuild) -> Self {
        let mut navigator = Self::new(on_rebuild);
        navigator.install(Ring::new(tickers));
        navigator
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub fn last_direction(&self) -> Direction {
        self.last
    }

    /// Ticker under the cursor.
    pub fn current(&self) -> Option<&Ticker> {
        self.cursor.and_then(|index| self.ring.get(index))
    }

    /// Emit the next ticker going forward.
    pub fn step_forward(&mut self) -> Option<Ticker> {
        let index = self.cursor?;
        let emit = if self.last == Direction::Backward {
            self.ring.next(self.ring.next(index))
        } else {
            index
        };
        let ticker = self.ring.get(emit)?.clone();
        self.cursor = Some(self.ring.next(emit));
        self.last = Direction::Forward;
        Some(ticker)
    }

    /// Emit the next ticker going backward.
    pub fn step_backward(&mut self) -> Option<Ticker> {
        let index = self.cursor?;
        let emit = if self.last == Direction::Forward {
            self.ring.prev(self.ring.prev(index))
        } else {
            index
        };
        let ticker = self.ring.get(emit)?.clone();
        self.cursor = Some(self.ring.prev(emit));
        self.last = Direction::Backward;
        Some(ticker)
    }

    /// The most recently emitted ticker, packaged as an open-view query.
    ///
    /// `None` until a direction has been committed or when the ring is empty.
    pub fn emit_for_open_view(&self) -> Option<OpenView> {
        let index = self.cursor?;
        let neighbor = match self.last {
            Direction::Neutral => return None,
            Direction::Forward => self.ring.prev(index),
            Direction::Backward => self.ring.next(index),
        };
        self.ring.get(neighbor).cloned().map(OpenView::for_ticker)
    }

    /// Rebuild from a new visible sequence.
    pub fn rebuild(&mut self, tickers: Vec<Ticker>) {
        self.install(Ring::new(tickers));
    }

    /// Swap in a fully built ring, keeping the cursor on the same ticker when possible.
    pub fn install(&mut self, ring: Ring) {
        let anchored = self.current().and_then(|ticker| ring.position(ticker));
        let cursor = anchored.or_else(|| ring.head());
        debug!(size = ring.len(), anchored = anchored.is_some(), "navigator ring rebuilt");

        self.ring = ring;
        self.cursor = cursor;
        // An empty ring has nothing to reverse away from.
        if self.on_rebuild == DirectionOnRebuild::Reset || self.cursor.is_none() {
            self.last = Direction::Neutral;
        }
    }
}
