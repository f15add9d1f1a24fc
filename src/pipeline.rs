//! Load, travel, save.
//!
//! Each stage of a bump is a capability trait. [`Pipeline`] is wired once at
//! startup from concrete implementations and then visits every target in
//! configuration order. Targets are independent: a failure stops the pipeline
//! but does not undo targets that were already saved.

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::target::{Target, TargetLoad, TargetSave};
use crate::version::{self, compute_future_version, Version, VersionSource};

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetChange {
    pub target: String,
    pub previous: Version,
    pub next: Version,
    /// Whether the content declared a version; undeclared content is left unchanged.
    pub declared: bool,
}

/// Moves the version held in a loaded target's content.
pub trait VersionTravel {
    fn travel(&self, target: &mut Target) -> Result<TargetChange>;
}

/// Semantic-versioning travel over `__version__` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticTravel;

impl VersionTravel for SemanticTravel {
    fn travel(&self, target: &mut Target) -> Result<TargetChange> {
        let content = target.loaded_content()?;
        let source = VersionSource::locate(content);
        let previous = VersionSource::version_or_default(source.as_ref());

        let next = compute_future_version(
            &previous,
            &target.directive,
            target.override_version.as_ref(),
        );
        let matched = source.as_ref().map(|s| s.text.as_str()).unwrap_or("");
        let rewritten = version::rewrite(content, matched, &next.to_string());

        debug!(
            target_name = %target.id,
            increment = %target.directive.kind,
            %previous,
            %next,
            "computed future version"
        );

        target.content = Some(rewritten);
        Ok(TargetChange {
            target: target.id.clone(),
            previous,
            next,
            declared: source.is_some(),
        })
    }
}

/// An explicit composition of the three stages.
pub struct Pipeline<'a> {
    loader: &'a dyn TargetLoad,
    travel: &'a dyn VersionTravel,
    saver: &'a dyn TargetSave,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        loader: &'a dyn TargetLoad,
        travel: &'a dyn VersionTravel,
        saver: &'a dyn TargetSave,
    ) -> Self {
        Pipeline {
            loader,
            travel,
            saver,
        }
    }

    /// Runs every target in order, saving each before moving to the next.
    ///
    /// With `dry_run` the targets are loaded and computed but never saved.
    #[instrument(skip_all, fields(targets = targets.len(), dry_run = dry_run))]
    pub fn run(&self, targets: Vec<Target>, dry_run: bool) -> Result<Vec<TargetChange>> {
        let mut changes = Vec::with_capacity(targets.len());

        for mut target in targets {
            self.loader.load(&mut target)?;
            let change = self.travel.travel(&mut target)?;
            if !dry_run {
                self.saver.save(&target)?;
                info!(target_name = %change.target, version = %change.next, "target updated");
            }
            changes.push(change);
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VersionMachineError;
    use crate::target::MemoryStore;
    use crate::version::IncrementKind;

    #[test]
    fn test_travel_rewrites_declaration() {
        let mut target = Target::new("main", "v.py", IncrementKind::Minor);
        target.content = Some("__version__ = '0.0.1'\n".to_string());

        let change = SemanticTravel.travel(&mut target).unwrap();
        assert_eq!(change.previous, Version::new(0, 0, 1));
        assert_eq!(change.next, Version::new(0, 1, 0));
        assert!(change.declared);
        assert_eq!(target.content.as_deref(), Some("__version__ = \"0.1.0\"\n"));
    }

    #[test]
    fn test_travel_without_declaration_uses_override_but_keeps_content() {
        let mut target =
            Target::new("main", "v.py", IncrementKind::Patch).with_override(Version::new(9, 9, 9));
        target.content = Some(String::new());

        let change = SemanticTravel.travel(&mut target).unwrap();
        assert_eq!(change.previous, Version::default());
        assert_eq!(change.next.to_string(), "9.9.9");
        assert!(!change.declared);
        assert_eq!(target.content.as_deref(), Some(""));
    }

    #[test]
    fn test_pipeline_visits_targets_in_order() {
        let store = MemoryStore::new();
        store.insert("a.py", "__version__ = \"1.2.3\"");
        store.insert("b.py", "__version__ = \"0.9.0\"");

        let targets = vec![
            Target::new("one", "a.py", IncrementKind::Patch),
            Target::new("two", "b.py", IncrementKind::Major),
        ];
        let pipeline = Pipeline::new(&store, &SemanticTravel, &store);
        let changes = pipeline.run(targets, false).unwrap();

        let names: Vec<&str> = changes.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(store.get("a.py").unwrap(), "__version__ = \"1.2.4\"");
        assert_eq!(store.get("b.py").unwrap(), "__version__ = \"1.0.0\"");
    }

    #[test]
    fn test_pipeline_dry_run_saves_nothing() {
        let store = MemoryStore::new();
        store.insert("a.py", "__version__ = \"1.2.3\"");

        let pipeline = Pipeline::new(&store, &SemanticTravel, &store);
        let changes = pipeline
            .run(vec![Target::new("one", "a.py", IncrementKind::Major)], true)
            .unwrap();

        assert_eq!(changes[0].next.to_string(), "2.0.0");
        assert_eq!(store.get("a.py").unwrap(), "__version__ = \"1.2.3\"");
    }

    #[test]
    fn test_pipeline_failure_keeps_earlier_writes() {
        let store = MemoryStore::new();
        store.insert("a.py", "__version__ = \"1.0.0\"");

        let targets = vec![
            Target::new("one", "a.py", IncrementKind::Patch),
            Target::new("two", "missing.py", IncrementKind::Patch),
        ];
        let pipeline = Pipeline::new(&store, &SemanticTravel, &store);
        let err = pipeline.run(targets, false).unwrap_err();

        assert!(matches!(err, VersionMachineError::TargetIo { ref target, .. } if target == "two"));
        assert_eq!(store.get("a.py").unwrap(), "__version__ = \"1.0.1\"");
    }
}
