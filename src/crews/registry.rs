use super::{basic, development, research, Crew};
use crate::types::{AppError, Result};
use std::collections::HashMap;

type CrewFactory = fn() -> Crew;

/// Name → crew lookup. Names are matched case-insensitively.
pub struct CrewRegistry {
    crews: HashMap<String, CrewFactory>,
}

impl Default for CrewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CrewRegistry {
    /// Registry holding the built-in crews.
    pub fn new() -> Self {
        let crews = HashMap::from([
            (basic::NAME.to_string(), basic::crew as CrewFactory),
            (research::NAME.to_string(), research::crew as CrewFactory),
            (development::NAME.to_string(), development::crew as CrewFactory),
        ]);
        Self { crews }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.crews.contains_key(&name.to_lowercase())
    }

    /// Build the crew registered under `name`.
    pub fn get(&self, name: &str) -> Result<Crew> {
        self.crews
            .get(&name.to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Crew '{}' is not a valid crew type.", name))
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.crews.keys().cloned().collect();
        names.sort();
        names
    }
}
