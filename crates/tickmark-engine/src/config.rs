//! Engine configuration.
//!
//! One immutable value threaded through discovery, propagation and linting.
//! Loading it from disk is the config crate's job; every section falls back to
//! its defaults when absent.

use serde::{Deserialize, Serialize};

use crate::lint::LinterConfig;
use crate::todo::{MarkerGlyphs, MetadataSchema, SmartToggleConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoConfig {
    pub markers: MarkerGlyphs,
    pub smart_toggle: SmartToggleConfig,
    pub metadata: MetadataSchema,
    pub linter: LinterConfig,
}

impl TodoConfig {
    /// Problems worth telling the user about. None of them stop the engine.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.markers.unchecked.is_empty() || self.markers.checked.is_empty() {
            warnings.push("empty marker glyph: only [ ]/[x] checkboxes will be recognised".into());
        }
        if self.markers.unchecked == self.markers.checked {
            warnings.push(format!(
                "checked and unchecked glyphs are both '{}'",
                self.markers.unchecked
            ));
        }
        for (alias, owners) in self.metadata.alias_conflicts() {
            warnings.push(format!(
                "alias '{alias}' is claimed by {}; '{}' wins",
                owners.join(", "),
                owners.last().map(String::as_str).unwrap_or_default()
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::Propagation;

    #[test]
    fn defaults_are_warning_free() {
        assert!(TodoConfig::default().warnings().is_empty());
    }

    #[test]
    fn reports_alias_conflicts() {
        let config = TodoConfig {
            metadata: MetadataSchema::empty()
                .with_tag("priority", &["p"])
                .with_tag("project", &["p"]),
            ..TodoConfig::default()
        };
        assert_eq!(
            config.warnings(),
            vec!["alias 'p' is claimed by priority, project; 'project' wins".to_string()]
        );
    }

    #[test]
    fn default_policies() {
        let toggle = TodoConfig::default().smart_toggle;
        assert_eq!(toggle.check_down, Propagation::DirectChildren);
        assert_eq!(toggle.uncheck_down, Propagation::None);
    }
}
