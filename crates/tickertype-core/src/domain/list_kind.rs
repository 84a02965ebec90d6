use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The three independently persisted ticker lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// User-curated additions. Never pruned automatically.
    Original,
    /// Last successful fetch result. Replaced wholesale on refresh.
    Fetched,
    /// Soft-deleted tickers excluded from the visible set.
    Blacklist,
}

impl ListKind {
    pub const ALL: [Self; 3] = [Self::Original, Self::Fetched, Self::Blacklist];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Fetched => "fetched",
            Self::Blacklist => "blacklist",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Original => "original.txt",
            Self::Fetched => "fetched.txt",
            Self::Blacklist => "blacklist.txt",
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
