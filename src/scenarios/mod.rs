pub mod random_access;
pub mod relative_mount;
pub mod rename_dir;
pub mod rename_file;

use crate::config::RunOptions;
use crate::error::{MirrorcheckError, Result};

type ScenarioFn = fn(&RunOptions) -> Result<()>;

/// A named verification scenario. Each runs against a freshly provisioned
/// testbed with an RNG seeded from the run seed, so any scenario can be
/// replayed in isolation.
#[derive(Debug)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    run: ScenarioFn,
}

impl Scenario {
    pub fn run(&self, opts: &RunOptions) -> Result<()> {
        (self.run)(opts)
    }
}

/// The scenario registry, shared by `run` and `list`.
pub fn all() -> &'static [Scenario] {
    SCENARIOS
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "random-access",
        description: "Randomized paired seek+read cycles on a mounted file vs its source",
        run: random_access::run,
    },
    Scenario {
        name: "relative-path",
        description: "Mount via a relative source path from a different working directory",
        run: relative_mount::run,
    },
    Scenario {
        name: "rename-file",
        description: "File rename is visible on both trees, old name on neither",
        run: rename_file::visibility,
    },
    Scenario {
        name: "rename-swap-open",
        description: "Two-step file swap with descriptors held open across the renames",
        run: rename_file::swap_with_open_descriptors,
    },
    Scenario {
        name: "rename-swap-closed",
        description: "Two-step file swap after the descriptors were closed",
        run: rename_file::swap_after_close,
    },
    Scenario {
        name: "rename-dir",
        description: "Directory rename re-roots contained files on both trees",
        run: rename_dir::visibility,
    },
    Scenario {
        name: "rename-dir-swap",
        description: "Two-step directory swap with descriptors held open",
        run: rename_dir::swap_with_open_descriptors,
    },
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    all().iter().find(|scenario| scenario.name == name)
}

/// Resolve user-supplied scenario names against the registry, preserving the
/// requested order.
pub fn resolve(names: &[String]) -> Result<Vec<&'static Scenario>> {
    names
        .iter()
        .map(|name| find(name).ok_or_else(|| MirrorcheckError::UnknownScenario(name.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<_> = all().iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_find_known_scenario() {
        assert!(find("random-access").is_some());
        assert!(find("rename-swap-open").is_some());
        assert!(find("no-such-scenario").is_none());
    }

    #[test]
    fn test_resolve_preserves_order_and_flags_unknown() {
        let resolved = resolve(&["rename-file".to_string(), "random-access".to_string()]).unwrap();
        assert_eq!(resolved[0].name, "rename-file");
        assert_eq!(resolved[1].name, "random-access");

        let err = resolve(&["bogus".to_string()]).unwrap_err();
        assert!(matches!(err, MirrorcheckError::UnknownScenario(_)));
        assert!(err.to_string().contains("bogus"));
    }
}
