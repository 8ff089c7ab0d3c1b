//! Named routine options.
//!
//! The selector maps operator-facing option names to a routine kind and the
//! path it drives. Nothing is built until `build()` is called right before the
//! autonomous period, so the selection can change freely beforehand.

use tracing::{debug, info};

use gridlock_common::auto::AutoTimings;

use super::path::{PathFollowerFactory, PathGroup, ResolvedPath};
use super::routines::RoutineKind;
use super::RoutineError;
use crate::action::BoxedAction;
use crate::robot::Robot;

/// Option selected when nothing else is chosen.
pub const DEFAULT_OPTION: &str = "Do Nothing";

#[derive(Debug, Clone, PartialEq, Eq)]
struct AutoOption {
    name: String,
    kind: RoutineKind,
    path: Option<String>,
}

/// Routine chooser.
#[derive(Debug, Clone)]
pub struct AutoSelector {
    options: Vec<AutoOption>,
    selected: usize,
}

impl Default for AutoSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoSelector {
    /// Selector holding only the default "Do Nothing" option.
    pub fn new() -> Self {
        Self {
            options: vec![AutoOption {
                name: DEFAULT_OPTION.to_string(),
                kind: RoutineKind::DoNothing,
                path: None,
            }],
            selected: 0,
        }
    }

    /// Every catalogue routine on its same-named path, plus red-alliance
    /// variants.
    pub fn standard() -> Self {
        let mut selector = Self::new();
        for kind in RoutineKind::ALL {
            if kind == RoutineKind::DoNothing {
                continue;
            }
            selector.add_option(kind.name(), kind, Some(kind.name()));
            let red = format!("Red{}", kind.name());
            selector.add_option(&red, kind, Some(&red));
        }
        selector
    }

    /// Add an option, replacing any option with the same name.
    pub fn add_option(
        &mut self,
        name: &str,
        kind: RoutineKind,
        path: Option<&str>,
    ) -> &mut Self {
        let option = AutoOption {
            name: name.to_string(),
            kind,
            path: path.map(str::to_string),
        };
        match self.options.iter_mut().find(|o| o.name == name) {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
        self
    }

    pub fn select(&mut self, name: &str) -> Result<(), RoutineError> {
        let index = self
            .options
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| RoutineError::UnknownRoutine(name.to_string()))?;
        self.selected = index;
        info!(option = name, "autonomous routine selected");
        Ok(())
    }

    /// Name of the selected option.
    pub fn selected(&self) -> &str {
        &self.options[self.selected].name
    }

    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.name.as_str())
    }

    /// Assemble the selected routine against the loaded paths.
    pub fn build(
        &self,
        paths: &[PathGroup],
        follower: &dyn PathFollowerFactory<Robot>,
        timings: &AutoTimings,
    ) -> Result<BoxedAction<Robot>, RoutineError> {
        let option = &self.options[self.selected];
        let path_name = option.path.as_deref().unwrap_or(&option.name);
        let group = option
            .path
            .as_deref()
            .map(|name| find_path(paths, name))
            .transpose()?;
        let routine = option.kind.build(path_name, group, follower, timings)?;
        debug!(
            option = %option.name,
            kind = option.kind.name(),
            mirrored = group.is_some_and(|g| g.is_mirrored()),
            requirements = ?routine.requirements(),
            "autonomous routine assembled"
        );
        Ok(routine)
    }
}

/// Look a path up by name.
///
/// An exact match is driven as stored. Alliance-prefixed names (`Red*`,
/// `Blue*`) without a group of their own fall back to the unprefixed group,
/// which is blue-side: a `Red*` fallback is mirrored.
pub fn find_path<'a>(
    paths: &'a [PathGroup],
    name: &str,
) -> Result<ResolvedPath<'a>, RoutineError> {
    if let Some(group) = paths.iter().find(|p| p.name() == name) {
        return Ok(ResolvedPath::exact(group));
    }
    let (base, red) = match name.strip_prefix("Red") {
        Some(base) => (base, true),
        None => (name.strip_prefix("Blue").unwrap_or(name), false),
    };
    let group = paths
        .iter()
        .find(|p| p.name() == base)
        .ok_or_else(|| RoutineError::MissingPath(name.to_string()))?;
    Ok(if red {
        ResolvedPath::mirrored(group)
    } else {
        ResolvedPath::exact(group)
    })
}
