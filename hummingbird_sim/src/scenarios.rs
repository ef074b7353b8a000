//! Foraging scenarios for the simulation harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// One trainee in a small meadow
    SoloForage,

    /// Several trainees competing for the same flowers
    SharedMeadow,

    /// Arena too small for any spawn candidate
    BlockedSpawn,

    /// Gameplay mode with a frozen agent
    Gameplay,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SoloForage,
            ScenarioId::SharedMeadow,
            ScenarioId::BlockedSpawn,
            ScenarioId::Gameplay,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SoloForage => "solo_forage",
            ScenarioId::SharedMeadow => "shared_meadow",
            ScenarioId::BlockedSpawn => "blocked_spawn",
            ScenarioId::Gameplay => "gameplay",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SoloForage => "Single training agent, 3 plants x 3 flowers, nectar bookkeeping checks",
            ScenarioId::SharedMeadow => "Several training agents on one area, at most one feed per flower per tick",
            ScenarioId::BlockedSpawn => "Every spawn candidate collides; fallback pose and boundary penalty",
            ScenarioId::Gameplay => "No rewards, unbounded episodes, agent 0 frozen for the middle third",
        }
    }

    /// Minimum number of agents the scenario needs.
    pub fn min_agents(&self) -> usize {
        match self {
            ScenarioId::SoloForage | ScenarioId::BlockedSpawn => 1,
            ScenarioId::SharedMeadow | ScenarioId::Gameplay => 2,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solo_forage" | "soloforage" | "solo" => Ok(ScenarioId::SoloForage),
            "shared_meadow" | "sharedmeadow" | "shared" => Ok(ScenarioId::SharedMeadow),
            "blocked_spawn" | "blockedspawn" | "blocked" => Ok(ScenarioId::BlockedSpawn),
            "gameplay" | "play" => Ok(ScenarioId::Gameplay),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
