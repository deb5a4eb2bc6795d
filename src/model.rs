use crate::error::{PortraitError, PortraitResult};

/// The closed set of sports the service generates portraits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Soccer,
    Basketball,
    Baseball,
    Football,
    Volleyball,
    Softball,
    Lacrosse,
    Hockey,
}

impl Sport {
    pub const ALL: [Sport; 8] = [
        Sport::Soccer,
        Sport::Basketball,
        Sport::Baseball,
        Sport::Football,
        Sport::Volleyball,
        Sport::Softball,
        Sport::Lacrosse,
        Sport::Hockey,
    ];

    /// Stable wire identifier, as the backend expects it.
    pub fn id(self) -> &'static str {
        match self {
            Sport::Soccer => "soccer",
            Sport::Basketball => "basketball",
            Sport::Baseball => "baseball",
            Sport::Football => "football",
            Sport::Volleyball => "volleyball",
            Sport::Softball => "softball",
            Sport::Lacrosse => "lacrosse",
            Sport::Hockey => "hockey",
        }
    }

    /// Human-readable label used in the overlay subtitle.
    pub fn label(self) -> &'static str {
        match self {
            Sport::Soccer => "Soccer",
            Sport::Basketball => "Basketball",
            Sport::Baseball => "Baseball",
            Sport::Football => "Football",
            Sport::Volleyball => "Volleyball",
            Sport::Softball => "Softball",
            Sport::Lacrosse => "Lacrosse",
            Sport::Hockey => "Hockey",
        }
    }

    pub fn from_id(id: &str) -> Option<Sport> {
        Sport::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Sport {
    type Err = PortraitError;

    fn from_str(s: &str) -> PortraitResult<Self> {
        Sport::from_id(s).ok_or_else(|| {
            PortraitError::validation(format!(
                "unknown sport '{s}' (expected one of: {})",
                Sport::ALL.map(Sport::id).join(", ")
            ))
        })
    }
}

/// Identity details rendered onto the portrait and sent with the generation
/// request. Empty strings mean "not provided".
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerMetadata {
    pub name: String,
    pub number: String,
    pub position: String,
}

impl PlayerMetadata {
    pub fn new(
        name: impl Into<String>,
        number: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            position: position.into(),
        }
    }

    /// Name and number must be non-empty after trimming before generation is
    /// permitted; position stays optional.
    pub fn validate(&self) -> PortraitResult<()> {
        if self.name.trim().is_empty() {
            return Err(PortraitError::validation("player name must not be empty"));
        }
        if self.number.trim().is_empty() {
            return Err(PortraitError::validation("jersey number must not be empty"));
        }
        Ok(())
    }

    /// Copy with all fields trimmed, as they are transmitted and rendered.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            number: self.number.trim().to_string(),
            position: self.position.trim().to_string(),
        }
    }

    /// The name as it appears on the portrait.
    pub fn display_name(&self) -> String {
        self.name.trim().to_uppercase()
    }
}

/// Read-only mirror of the remote credit balance. Advisory: the server is
/// the source of truth and performs the actual decrement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreditState {
    pub credits: u32,
    pub free_remaining: u32,
}

impl CreditState {
    pub fn total(self) -> u32 {
        self.credits + self.free_remaining
    }

    pub fn any_remaining(self) -> bool {
        self.total() > 0
    }
}
