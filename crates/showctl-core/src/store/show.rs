use serde::{Deserialize, Serialize};

/// What the client knows about the show file the server has open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowState {
    pub name: Option<String>,
    /// Saves of the current show.
    pub saves: Vec<String>,
    /// Shows in the server's library.
    pub shows: Vec<String>,
    pub last_error: Option<String>,
    pub saved_at_least_once: bool,
    /// Bumped on every saves listing, even an unchanged one.
    #[serde(skip)]
    pub saves_version: u64,
    /// Bumped on every library listing.
    #[serde(skip)]
    pub shows_version: u64,
    /// Shows loaded or started since the client connected.
    #[serde(skip)]
    pub loads: u64,
}
