//! Path resolution
//!
//! Maps an [`EditingContext`] and a selected stage to the [`DocPath`] of the
//! `artifacts` container that context edits.
//!
//! Pipeline shape:
//!
//! ```text
//! pipeline.stages[i].stage                      plain stage
//! pipeline.stages[i].parallel[j].stage          stage inside a parallel group
//! <stage>.stage.spec.serviceConfig
//!     .serviceDefinition.spec.artifacts         Plain
//!     .serviceDefinition.spec.artifactOverrideSets[k](.overrideSet).artifacts
//!     .stageOverrides.artifacts                 StagePropagation
//!     .useFromStage.stage                       parent stage identifier
//! ```

use crate::error::ResolveError;
use pax_document::{patch::lookup, DocPath, Node};
use std::fmt::{self, Display, Formatter};

const SERVICE_CONFIG: [&str; 3] = ["stage", "spec", "serviceConfig"];
const DEFINITION_ARTIFACTS: [&str; 3] = ["serviceDefinition", "spec", "artifacts"];
const OVERRIDE_SETS: [&str; 3] = ["serviceDefinition", "spec", "artifactOverrideSets"];
const STAGE_OVERRIDE_ARTIFACTS: [&str; 2] = ["stageOverrides", "artifacts"];
const USE_FROM_STAGE: [&str; 2] = ["useFromStage", "stage"];

/// Where artifacts are being edited
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditingContext {
    /// The stage's own service definition
    Plain,
    /// A named override set on the stage
    OverrideSet(String),
    /// Stage-level overrides replacing inherited artifacts
    StagePropagation,
    /// An override set defined on an upstream stage
    ParentOverrideSet {
        override_set: String,
        parent_stage: String,
    },
}

impl EditingContext {
    /// Override set on the stage the selected stage propagates from
    ///
    /// Reads the parent from `spec.serviceConfig.useFromStage.stage`.
    ///
    /// # Errors
    /// [`ResolveError::StageNotFound`] when the selected stage is missing,
    /// [`ResolveError::NoParentStage`] when it does not propagate.
    pub fn inherited(root: &Node, stage: &str, override_set: impl Into<String>) -> Result<Self, ResolveError> {
        let stage_path = find_stage(root, stage)?;
        let parent = lookup(root, &stage_path.extend_keys(&SERVICE_CONFIG).extend_keys(&USE_FROM_STAGE))?
            .and_then(Node::as_str)
            .ok_or_else(|| ResolveError::NoParentStage(stage.to_string()))?;
        Ok(Self::ParentOverrideSet {
            override_set: override_set.into(),
            parent_stage: parent.to_string(),
        })
    }

    /// Override set being edited, if any
    #[inline]
    #[must_use]
    pub fn override_set(&self) -> Option<&str> {
        match self {
            Self::OverrideSet(id) | Self::ParentOverrideSet { override_set: id, .. } => Some(id),
            Self::Plain | Self::StagePropagation => None,
        }
    }
}

impl Display for EditingContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::OverrideSet(id) => write!(f, "override_set({id})"),
            Self::StagePropagation => f.write_str("stage_propagation"),
            Self::ParentOverrideSet {
                override_set,
                parent_stage,
            } => write!(f, "parent_override_set({parent_stage}/{override_set})"),
        }
    }
}

/// A stage located in the flattened stage sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLocation {
    /// Path of the `{stage: ...}` element
    pub path: DocPath,
    /// `stage.identifier`
    pub identifier: Option<String>,
    /// `stage.name`
    pub name: Option<String>,
}

/// Path of the pipeline's stage list
///
/// `pipeline.stages` when the root wraps the body in `pipeline`, else `stages`.
#[must_use]
pub fn stages_path(root: &Node) -> DocPath {
    if root.get("pipeline").is_some() {
        DocPath::keys(&["pipeline", "stages"])
    } else {
        DocPath::keys(&["stages"])
    }
}

/// All stages in document order, descending into parallel groups
///
/// # Errors
/// [`ResolveError::Document`] when the stage list path runs through a scalar.
pub fn flattened_stages(root: &Node) -> Result<Vec<StageLocation>, ResolveError> {
    let base = stages_path(root);
    let Some(stages) = lookup(root, &base)?.and_then(Node::as_array) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (i, element) in stages.iter().enumerate() {
        let element_path = base.index(i);
        if let Some(stage) = element.get("stage") {
            out.push(locate(element_path, stage));
        } else if let Some(group) = element.get("parallel").and_then(Node::as_array) {
            for (j, member) in group.iter().enumerate() {
                if let Some(stage) = member.get("stage") {
                    out.push(locate(element_path.key("parallel").index(j), stage));
                }
            }
        }
    }
    Ok(out)
}

fn locate(path: DocPath, stage: &Node) -> StageLocation {
    StageLocation {
        path,
        identifier: stage.get_str("identifier").map(str::to_string),
        name: stage.get_str("name").map(str::to_string),
    }
}

/// Path of the stage element whose identifier is `identifier`
///
/// # Errors
/// [`ResolveError::StageNotFound`] when no stage matches.
pub fn find_stage(root: &Node, identifier: &str) -> Result<DocPath, ResolveError> {
    flattened_stages(root)?
        .into_iter()
        .find(|s| s.identifier.as_deref() == Some(identifier))
        .map(|s| s.path)
        .ok_or_else(|| ResolveError::StageNotFound(identifier.to_string()))
}

/// Path of the first stage named `name`
///
/// Falls back to the first stage whose identifier is `name` when no stage
/// carries that name.
///
/// # Errors
/// [`ResolveError::StageNotFound`] when no stage matches either way.
pub fn find_stage_by_name(root: &Node, name: &str) -> Result<DocPath, ResolveError> {
    let stages = flattened_stages(root)?;
    stages
        .iter()
        .find(|s| s.name.as_deref() == Some(name))
        .or_else(|| stages.iter().find(|s| s.identifier.as_deref() == Some(name)))
        .map(|s| s.path.clone())
        .ok_or_else(|| ResolveError::StageNotFound(name.to_string()))
}

/// Path of the `artifacts` container edited by `context` on `stage`
///
/// The container itself may be absent; readers treat that as empty and the
/// patcher creates it on first write.
///
/// # Errors
/// Not-found stage or override set, or a document shape that blocks
/// traversal.
pub fn resolve(context: &EditingContext, root: &Node, stage: &str) -> Result<DocPath, ResolveError> {
    let stage_path = find_stage(root, stage)?;
    let service_config = stage_path.extend_keys(&SERVICE_CONFIG);
    match context {
        EditingContext::Plain => Ok(service_config.extend_keys(&DEFINITION_ARTIFACTS)),
        EditingContext::StagePropagation => Ok(service_config.extend_keys(&STAGE_OVERRIDE_ARTIFACTS)),
        EditingContext::OverrideSet(identifier) => override_set_artifacts(root, &stage_path, identifier, stage),
        EditingContext::ParentOverrideSet {
            override_set,
            parent_stage,
        } => {
            let parent_path = find_stage_by_name(root, parent_stage)?;
            override_set_artifacts(root, &parent_path, override_set, parent_stage)
        }
    }
}

fn override_set_artifacts(
    root: &Node,
    stage_path: &DocPath,
    identifier: &str,
    stage_label: &str,
) -> Result<DocPath, ResolveError> {
    let sets_path = stage_path.extend_keys(&SERVICE_CONFIG).extend_keys(&OVERRIDE_SETS);
    let not_found = || ResolveError::OverrideSetNotFound {
        identifier: identifier.to_string(),
        stage: stage_label.to_string(),
    };

    let sets = lookup(root, &sets_path)?
        .and_then(Node::as_array)
        .ok_or_else(not_found)?;

    sets.iter()
        .enumerate()
        .find_map(|(i, element)| {
            let item = sets_path.index(i);
            match element.get("overrideSet") {
                Some(wrapped) if wrapped.get_str("identifier") == Some(identifier) => {
                    Some(item.key("overrideSet").key("artifacts"))
                }
                None if element.get_str("identifier") == Some(identifier) => Some(item.key("artifacts")),
                _ => None,
            }
        })
        .ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pax_document::node;

    fn pipeline() -> Node {
        node!({
            "pipeline": {
                "identifier": "release",
                "stages": [
                    {"stage": {
                        "identifier": "build",
                        "name": "Build",
                        "spec": {"serviceConfig": {"serviceDefinition": {"spec": {
                            "artifacts": {"primary": {"type": "DockerRegistry", "spec": {}}},
                            "artifactOverrideSets": [
                                {"overrideSet": {"identifier": "prod", "artifacts": {"primary": {"type": "Ecr", "spec": {}}}}},
                                {"identifier": "set1", "artifacts": {"primary": {"type": "Gcr", "spec": {}}}}
                            ]
                        }}}}
                    }},
                    {"parallel": [
                        {"stage": {"identifier": "qa", "name": "QA", "spec": {}}},
                        {"stage": {
                            "identifier": "deploy",
                            "name": "Deploy",
                            "spec": {"serviceConfig": {"useFromStage": {"stage": "build"}}}
                        }}
                    ]}
                ]
            }
        })
    }

    #[test]
    fn flattens_parallel_groups() {
        let stages = flattened_stages(&pipeline()).unwrap();
        let ids: Vec<_> = stages.iter().map(|s| s.identifier.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["build", "qa", "deploy"]);
        assert_eq!(stages[2].path.to_string(), "pipeline.stages[1].parallel[1]");
    }

    #[test]
    fn root_without_pipeline_key() {
        let root = node!({"stages": [{"stage": {"identifier": "only"}}]});
        assert_eq!(find_stage(&root, "only").unwrap().to_string(), "stages[0]");
    }

    #[test]
    fn plain_path() {
        let path = resolve(&EditingContext::Plain, &pipeline(), "build").unwrap();
        assert_eq!(
            path.to_string(),
            "pipeline.stages[0].stage.spec.serviceConfig.serviceDefinition.spec.artifacts"
        );
    }

    #[test]
    fn propagation_path() {
        let path = resolve(&EditingContext::StagePropagation, &pipeline(), "deploy").unwrap();
        assert_eq!(
            path.to_string(),
            "pipeline.stages[1].parallel[1].stage.spec.serviceConfig.stageOverrides.artifacts"
        );
    }

    #[test]
    fn override_set_bare_entry() {
        let root = pipeline();
        let path = resolve(&EditingContext::OverrideSet("set1".into()), &root, "build").unwrap();
        let node = lookup(&root, &path).unwrap().unwrap();
        assert_eq!(node, &node!({"primary": {"type": "Gcr", "spec": {}}}));
    }

    #[test]
    fn override_set_wrapped_entry() {
        let path = resolve(&EditingContext::OverrideSet("prod".into()), &pipeline(), "build").unwrap();
        assert!(path.to_string().ends_with("artifactOverrideSets[0].overrideSet.artifacts"));
    }

    #[test]
    fn override_set_missing() {
        let err = resolve(&EditingContext::OverrideSet("missing".into()), &pipeline(), "build").unwrap_err();
        assert_eq!(
            err,
            ResolveError::OverrideSetNotFound {
                identifier: "missing".into(),
                stage: "build".into()
            }
        );
    }

    #[test]
    fn override_set_on_stage_without_sets() {
        let err = resolve(&EditingContext::OverrideSet("prod".into()), &pipeline(), "qa").unwrap_err();
        assert!(matches!(err, ResolveError::OverrideSetNotFound { .. }));
    }

    #[test]
    fn parent_override_set_by_name() {
        let context = EditingContext::ParentOverrideSet {
            override_set: "prod".into(),
            parent_stage: "Build".into(),
        };
        let path = resolve(&context, &pipeline(), "deploy").unwrap();
        assert!(path.to_string().starts_with("pipeline.stages[0].stage"));
    }

    #[test]
    fn parent_name_beats_earlier_identifier() {
        // First stage's identifier collides with the second stage's name
        let root = node!({"stages": [
            {"stage": {"identifier": "Build", "name": "Compile"}},
            {"stage": {"identifier": "build", "name": "Build"}}
        ]});
        assert_eq!(find_stage_by_name(&root, "Build").unwrap().to_string(), "stages[1]");
        assert_eq!(find_stage_by_name(&root, "build").unwrap().to_string(), "stages[1]");
        assert_eq!(find_stage_by_name(&root, "Compile").unwrap().to_string(), "stages[0]");
    }

    #[test]
    fn parent_without_matching_override_set() {
        let context = EditingContext::ParentOverrideSet {
            override_set: "staging".into(),
            parent_stage: "Build".into(),
        };
        let err = resolve(&context, &pipeline(), "deploy").unwrap_err();
        assert_eq!(
            err,
            ResolveError::OverrideSetNotFound {
                identifier: "staging".into(),
                stage: "Build".into()
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn parent_stage_missing() {
        let context = EditingContext::ParentOverrideSet {
            override_set: "prod".into(),
            parent_stage: "nowhere".into(),
        };
        let err = resolve(&context, &pipeline(), "deploy").unwrap_err();
        assert_eq!(err, ResolveError::StageNotFound("nowhere".into()));
    }

    #[test]
    fn inherited_reads_use_from_stage() {
        let context = EditingContext::inherited(&pipeline(), "deploy", "prod").unwrap();
        assert_eq!(
            context,
            EditingContext::ParentOverrideSet {
                override_set: "prod".into(),
                parent_stage: "build".into()
            }
        );
        assert_eq!(context.override_set(), Some("prod"));
    }

    #[test]
    fn inherited_without_parent() {
        let err = EditingContext::inherited(&pipeline(), "qa", "prod").unwrap_err();
        assert_eq!(err, ResolveError::NoParentStage("qa".into()));
    }

    #[test]
    fn selected_stage_missing() {
        let err = resolve(&EditingContext::Plain, &pipeline(), "ghost").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn scalar_stage_list_is_document_error() {
        let root = node!({"pipeline": {"stages": "oops"}});
        // A scalar list simply has no stages
        assert!(flattened_stages(&root).unwrap().is_empty());
        let root = node!({"pipeline": "oops"});
        assert!(matches!(flattened_stages(&root), Err(ResolveError::Document(_))));
    }
}
