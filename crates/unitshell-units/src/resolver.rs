//! Target resolution: one application plus an optional unit id to one unit

use tracing::debug;
use unitshell_domain::{App, ResolvedTarget, ShellError, ShellResult, Unit, UnitDirectory};

/// Picks the unit a session binds to.
///
/// Without an explicit unit the first unit in directory order wins. The unit
/// set is fetched once per resolution and never re-queried.
pub struct TargetResolver;

impl TargetResolver {
    /// Query `directory` for the units of `app` and pick one
    pub async fn resolve(
        directory: &dyn UnitDirectory,
        app: &App,
        unit_id: Option<&str>,
    ) -> ShellResult<ResolvedTarget> {
        let units = directory.list_units(app).await?;
        let target = Self::select(app, units, unit_id)?;
        debug!(
            app = %target.app.name,
            unit = %target.unit.id,
            pinned = target.pinned,
            "Resolved shell target"
        );
        Ok(target)
    }

    /// Pick a unit from an already fetched unit set
    pub fn select(app: &App, units: Vec<Unit>, unit_id: Option<&str>) -> ShellResult<ResolvedTarget> {
        let mut units: Vec<Unit> = units.into_iter().filter(|u| u.belongs_to(app)).collect();
        if units.is_empty() {
            return Err(ShellError::NoUnitsAvailable(app.name.clone()));
        }

        let (unit, pinned) = match unit_id {
            Some(id) => {
                let position = units.iter().position(|u| u.id == id).ok_or_else(|| {
                    ShellError::UnitNotFound {
                        app: app.name.clone(),
                        unit: id.to_string(),
                    }
                })?;
                (units.swap_remove(position), true)
            }
            None => (units.swap_remove(0), false),
        };

        Ok(ResolvedTarget {
            app: app.clone(),
            unit,
            pinned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUnitDirectory;

    fn units(app: &str, count: usize) -> Vec<Unit> {
        (0..count)
            .map(|i| Unit::new(format!("{app}-{i}"), app, "web"))
            .collect()
    }

    #[test]
    fn test_implicit_selection_picks_first() {
        let app = App::new("someapp", "admins");
        let target = TargetResolver::select(&app, units("someapp", 3), None).unwrap();
        assert_eq!(target.unit.id, "someapp-0");
        assert!(!target.pinned);
    }

    #[test]
    fn test_explicit_selection() {
        let app = App::new("someapp", "admins");
        let target = TargetResolver::select(&app, units("someapp", 5), Some("someapp-3")).unwrap();
        assert_eq!(target.unit.id, "someapp-3");
        assert!(target.pinned);
    }

    #[test]
    fn test_no_units() {
        let app = App::new("someapp", "admins");
        let err = TargetResolver::select(&app, vec![], None).unwrap_err();
        assert_eq!(err, ShellError::NoUnitsAvailable("someapp".to_string()));

        let err = TargetResolver::select(&app, vec![], Some("someapp-0")).unwrap_err();
        assert_eq!(err, ShellError::NoUnitsAvailable("someapp".to_string()));
    }

    #[test]
    fn test_unknown_unit() {
        let app = App::new("someapp", "admins");
        let err = TargetResolver::select(&app, units("someapp", 2), Some("nope")).unwrap_err();
        assert_eq!(
            err,
            ShellError::UnitNotFound {
                app: "someapp".to_string(),
                unit: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_foreign_unit_is_not_found() {
        let app = App::new("someapp", "admins");
        let mut mixed = units("someapp", 1);
        mixed.extend(units("otherapp", 1));

        let err = TargetResolver::select(&app, mixed, Some("otherapp-0")).unwrap_err();
        assert!(matches!(err, ShellError::UnitNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_through_directory() {
        let directory = MemoryUnitDirectory::new();
        let app = App::new("someapp", "admins");
        let other = App::new("otherapp", "admins");
        directory.add_units(&app, 2, "web");
        let foreign = directory.add_units(&other, 1, "web");

        let target = TargetResolver::resolve(&directory, &app, None).await.unwrap();
        assert_eq!(target.unit.id, "someapp-0");

        let err = TargetResolver::resolve(&directory, &app, Some(&foreign[0].id))
            .await
            .unwrap_err();
        assert!(matches!(err, ShellError::UnitNotFound { .. }));

        let empty = App::new("emptyapp", "admins");
        let err = TargetResolver::resolve(&directory, &empty, None).await.unwrap_err();
        assert_eq!(err, ShellError::NoUnitsAvailable("emptyapp".to_string()));
    }
}
