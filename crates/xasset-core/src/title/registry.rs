use std::collections::HashMap;

use tracing::debug;

use super::{GameMode, GameTitle, TitleSpec, bo2, bo3, ghosts, mw2, mw3, waw};

static BUILTIN: [TitleSpec; 6] = [
    waw::SPEC,
    mw2::SPEC,
    mw3::SPEC,
    bo2::SPEC,
    ghosts::SPEC,
    bo3::SPEC,
];

/// Every title known to this crate
pub fn builtin_titles() -> &'static [TitleSpec] {
    &BUILTIN
}

/// Title and mode owning a running executable, matched case-insensitively
pub fn detect_title(executable: &str) -> Option<(&'static TitleSpec, GameMode)> {
    let file = executable
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(executable);
    builtin_titles()
        .iter()
        .find_map(|spec| spec.mode_for_executable(file).map(|mode| (spec, mode)))
}

/// Title specs keyed by [`GameTitle`]
#[derive(Debug, Clone)]
pub struct TitleRegistry {
    titles: HashMap<GameTitle, &'static TitleSpec>,
}

impl Default for TitleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TitleRegistry {
    pub fn empty() -> Self {
        Self {
            titles: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for spec in builtin_titles() {
            registry.register(spec);
        }
        registry
    }

    /// Add or replace the spec for its title
    pub fn register(&mut self, spec: &'static TitleSpec) {
        debug!("Registering {}", spec.title);
        self.titles.insert(spec.title, spec);
    }

    pub fn get(&self, title: GameTitle) -> Option<&'static TitleSpec> {
        self.titles.get(&title).copied()
    }

    /// Executable names of every registered title, for process lookup
    pub fn executables(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .titles
            .values()
            .flat_map(|spec| spec.executables.iter().map(|(name, _)| *name))
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
