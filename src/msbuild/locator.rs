//! Cross-reference of the evaluated project onto the semantic model.
//!
//! For every evaluated entity declared in the *current* file (entities
//! pulled in through imports are skipped), the [`ProjectLocator`] resolves
//! the engine-reported declaration site to a byte offset, looks up the
//! declaring semantic node, and registers a [`ProjectObject`] keyed by that
//! node's range start. `find` then answers "which project object is at
//! this position" with the same containment contract as node lookup.

use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};
use tracing::{debug, warn};

use crate::base::LineIndex;
use crate::sema::{Element, NodeId, XmlLocator};

use super::evaluated::{DeclarationSite, EvaluatedProject};
use super::object::{ProjectObject, ProjectObjectData};

/// A facility for looking up evaluated project objects by text position.
pub struct ProjectLocator {
    /// Objects sorted by (range.start, range.end): document order.
    objects: Vec<ProjectObject>,
    /// Exact-match fast path: object index by starting offset.
    by_start: FxHashMap<TextSize, usize>,
}

impl ProjectLocator {
    /// Build the cross-reference for one document.
    pub fn new(project: &EvaluatedProject, locator: &XmlLocator, line_index: &LineIndex) -> Self {
        let mut builder = LocatorBuilder {
            project,
            locator,
            line_index,
            objects: Vec::new(),
        };

        builder.add_targets();
        builder.add_properties();
        builder.add_items();
        builder.add_imports();

        let mut objects = builder.objects;
        objects.sort_by_key(|object| (object.range.start(), object.range.end()));

        let mut by_start = FxHashMap::default();
        let mut keep = vec![true; objects.len()];
        for (index, object) in objects.iter().enumerate() {
            match by_start.entry(object.range.start()) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(index);
                }
                std::collections::hash_map::Entry::Occupied(entry) => {
                    // Two entities resolved to the same declaring range
                    // start. Keep the first registration; log enough to
                    // tell a harmless re-visit from a genuine duplicate.
                    let first: &ProjectObject = &objects[*entry.get()];
                    warn!(
                        start = u32::from(object.range.start()),
                        kept = %first.name(),
                        dropped = %object.name(),
                        same_underlying = first.is_same_underlying(object),
                        "duplicate project object registration at range start"
                    );
                    keep[index] = false;
                }
            }
        }

        let mut kept_objects = Vec::with_capacity(objects.len());
        for (object, keep) in objects.into_iter().zip(keep) {
            if keep {
                kept_objects.push(object);
            }
        }
        // Re-key after dropping duplicates.
        let by_start = kept_objects
            .iter()
            .enumerate()
            .map(|(index, object)| (object.range.start(), index))
            .collect();

        Self {
            objects: kept_objects,
            by_start,
        }
    }

    /// All known project objects, in document order.
    pub fn all_objects(&self) -> impl Iterator<Item = &ProjectObject> {
        self.objects.iter()
    }

    /// Find the project object (if any) at the given offset.
    pub fn find(&self, offset: TextSize) -> Option<&ProjectObject> {
        if let Some(&index) = self.by_start.get(&offset) {
            return Some(&self.objects[index]);
        }

        let upper = self
            .objects
            .partition_point(|object| object.range.start() <= offset);

        self.objects[..upper]
            .iter()
            .rev()
            .find(|object| object.contains(offset))
    }
}

struct LocatorBuilder<'a> {
    project: &'a EvaluatedProject,
    locator: &'a XmlLocator,
    line_index: &'a LineIndex,
    objects: Vec<ProjectObject>,
}

impl<'a> LocatorBuilder<'a> {
    /// Whether an entity is declared in the current file (as opposed to
    /// one pulled in transitively through an import).
    fn is_current_file(&self, site: &DeclarationSite) -> bool {
        site.file == self.project.file
    }

    /// Resolve an engine declaration site to the declaring element.
    ///
    /// The engine reports an invalid (zero) location for the `Sdk`
    /// attribute on the `Project` element itself; the saturating one-based
    /// conversion turns that into offset zero, which lands on the root
    /// element: exactly the element we want.
    fn declaring_element(&self, site: &DeclarationSite) -> Option<Element<'a>> {
        let offset = match self.line_index.position_to_offset(site.position()) {
            Ok(offset) => offset,
            Err(error) => {
                debug!(%error, "declaration site is outside the document");
                return None;
            }
        };

        let locator: &'a XmlLocator = self.locator;
        let node = locator.find_node(offset)?;
        match node.as_element() {
            Some(element) => Some(element),
            None => node.parent_element(),
        }
    }

    fn push(&mut self, node: NodeId, range: TextRange, data: ProjectObjectData) {
        self.objects.push(ProjectObject { node, range, data });
    }

    fn add_targets(&mut self) {
        for target in &self.project.targets {
            if !self.is_current_file(&target.site) {
                continue;
            }
            let Some(element) = self.declaring_element(&target.site) else {
                continue;
            };
            self.push(
                element.id(),
                element.range(),
                ProjectObjectData::Target(target.clone()),
            );
        }
    }

    fn add_properties(&mut self) {
        for property in &self.project.properties {
            if !self.is_current_file(&property.site) {
                continue;
            }
            let Some(element) = self.declaring_element(&property.site) else {
                continue;
            };
            self.push(
                element.id(),
                element.range(),
                ProjectObjectData::Property(property.clone()),
            );
        }
    }

    fn add_items(&mut self) {
        for item in &self.project.items {
            if !self.is_current_file(&item.site) {
                continue;
            }
            let Some(element) = self.declaring_element(&item.site) else {
                continue;
            };
            self.push(
                element.id(),
                element.range(),
                ProjectObjectData::ItemGroup(item.clone()),
            );
        }
    }

    fn add_imports(&mut self) {
        for import in &self.project.imports {
            if !self.is_current_file(&import.site) {
                continue;
            }
            let Some(element) = self.declaring_element(&import.site) else {
                continue;
            };

            if import.is_sdk() && import.resolved {
                // A resolved SDK-style import is anchored to the `Sdk`
                // attribute, not the whole element.
                let Some(attribute) = element.attribute("Sdk") else {
                    continue;
                };
                self.push(
                    attribute.id(),
                    attribute.range(),
                    ProjectObjectData::Import(import.clone()),
                );
            } else {
                self.push(
                    element.id(),
                    element.range(),
                    ProjectObjectData::Import(import.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msbuild::evaluated::{
        EvaluatedImport, EvaluatedItem, EvaluatedProperty, EvaluatedTarget, ItemInstance,
    };
    use crate::msbuild::object::ProjectObjectKind;
    use crate::sema::build_model;
    use crate::xml::parse;
    use smol_str::SmolStr;

    const PROJECT_FILE: &str = "/work/App.csproj";

    const SOURCE: &str = "\
<Project Sdk=\"Microsoft.NET.Sdk\">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <Extra Condition=\"false\">x</Extra>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include=\"**/*.cs\" />
  </ItemGroup>
  <Import Project=\"custom.props\" Condition=\"false\" />
  <Target Name=\"Build\" />
</Project>
";

    fn site(needle: &str) -> DeclarationSite {
        // One-based line/column of the needle's first character.
        let offset = SOURCE.find(needle).expect("needle present");
        let line = SOURCE[..offset].matches('\n').count() as u32 + 1;
        let column = (offset - SOURCE[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0)) as u32 + 1;
        DeclarationSite::new(PROJECT_FILE, line, column)
    }

    fn evaluated_project() -> EvaluatedProject {
        EvaluatedProject {
            file: PROJECT_FILE.into(),
            targets: vec![EvaluatedTarget {
                name: SmolStr::new("Build"),
                site: site("<Target"),
            }],
            properties: vec![
                EvaluatedProperty {
                    name: SmolStr::new("TargetFramework"),
                    raw_value: "net8.0".into(),
                    value: Some("net8.0".into()),
                    site: site("<TargetFramework"),
                    used: true,
                },
                EvaluatedProperty {
                    name: SmolStr::new("Extra"),
                    raw_value: "x".into(),
                    value: None,
                    site: site("<Extra"),
                    used: false,
                },
            ],
            items: vec![EvaluatedItem {
                item_type: SmolStr::new("Compile"),
                instances: vec![
                    ItemInstance {
                        include: "**/*.cs".into(),
                        evaluated_include: "Program.cs".into(),
                    },
                    ItemInstance {
                        include: "**/*.cs".into(),
                        evaluated_include: "Util.cs".into(),
                    },
                ],
                site: site("<Compile"),
                used: true,
            }],
            imports: vec![
                EvaluatedImport {
                    project: None,
                    sdk: Some(SmolStr::new("Microsoft.NET.Sdk")),
                    resolved_paths: vec!["/sdk/Sdk.props".into()],
                    // The engine reports no usable location for the
                    // project-level Sdk attribute.
                    site: DeclarationSite::new(PROJECT_FILE, 0, 0),
                    resolved: true,
                },
                EvaluatedImport {
                    project: Some("custom.props".into()),
                    sdk: None,
                    resolved_paths: vec![],
                    site: site("<Import"),
                    resolved: false,
                },
            ],
        }
    }

    fn build_locators() -> (XmlLocator, LineIndex) {
        let locator = XmlLocator::new(build_model(&parse(SOURCE)));
        let line_index = LineIndex::new(SOURCE);
        (locator, line_index)
    }

    fn offset_of(needle: &str) -> TextSize {
        TextSize::from(SOURCE.find(needle).expect("needle present") as u32)
    }

    #[test]
    fn registers_each_entity_kind() {
        let (locator, line_index) = build_locators();
        let project_locator = ProjectLocator::new(&evaluated_project(), &locator, &line_index);

        let kinds: Vec<ProjectObjectKind> = project_locator
            .all_objects()
            .map(|object| object.kind())
            .collect();

        assert!(kinds.contains(&ProjectObjectKind::Target));
        assert!(kinds.contains(&ProjectObjectKind::Property));
        assert!(kinds.contains(&ProjectObjectKind::UnusedProperty));
        assert!(kinds.contains(&ProjectObjectKind::ItemGroup));
        assert!(kinds.contains(&ProjectObjectKind::SdkImport));
        assert!(kinds.contains(&ProjectObjectKind::UnresolvedImport));
    }

    #[test]
    fn find_property_at_position() {
        let (locator, line_index) = build_locators();
        let project_locator = ProjectLocator::new(&evaluated_project(), &locator, &line_index);

        let object = project_locator
            .find(offset_of("net8.0"))
            .expect("property object at position");
        assert_eq!(object.kind(), ProjectObjectKind::Property);
        assert_eq!(object.name(), "TargetFramework");
    }

    #[test]
    fn sdk_import_is_anchored_to_sdk_attribute() {
        let (locator, line_index) = build_locators();
        let project_locator = ProjectLocator::new(&evaluated_project(), &locator, &line_index);

        let object = project_locator
            .find(offset_of("Microsoft.NET.Sdk"))
            .expect("sdk import at position");
        assert_eq!(object.kind(), ProjectObjectKind::SdkImport);

        // The object's range is the attribute, not the whole root element.
        let attribute_range = locator
            .model()
            .root()
            .unwrap()
            .attribute("Sdk")
            .unwrap()
            .range();
        assert_eq!(object.range, attribute_range);
    }

    #[test]
    fn item_group_groups_instances_under_one_object() {
        let (locator, line_index) = build_locators();
        let project_locator = ProjectLocator::new(&evaluated_project(), &locator, &line_index);

        let object = project_locator
            .find(offset_of("**/*.cs"))
            .expect("item object at position");
        let ProjectObjectData::ItemGroup(item) = &object.data else {
            panic!("expected an item group, got {:?}", object.kind());
        };
        assert_eq!(item.instances.len(), 2);
    }

    #[test]
    fn entities_from_other_files_are_skipped() {
        let (locator, line_index) = build_locators();

        let mut project = evaluated_project();
        for target in &mut project.targets {
            target.site.file = "/sdk/Sdk.targets".into();
        }
        let project_locator = ProjectLocator::new(&project, &locator, &line_index);

        assert!(
            project_locator
                .all_objects()
                .all(|object| object.kind() != ProjectObjectKind::Target)
        );
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let (locator, line_index) = build_locators();

        let mut project = evaluated_project();
        // A second property resolving to the same declaring element.
        let mut duplicate = project.properties[0].clone();
        duplicate.name = SmolStr::new("Shadow");
        project.properties.push(duplicate);

        let project_locator = ProjectLocator::new(&project, &locator, &line_index);

        let object = project_locator
            .find(offset_of("net8.0"))
            .expect("property object at position");
        // First registration wins, deterministically.
        assert_eq!(object.name(), "TargetFramework");

        let at_same_start: Vec<_> = project_locator
            .all_objects()
            .filter(|o| o.range == object.range)
            .collect();
        assert_eq!(at_same_start.len(), 1);
    }

    #[test]
    fn find_misses_outside_any_object() {
        let (locator, line_index) = build_locators();
        let project_locator = ProjectLocator::new(&evaluated_project(), &locator, &line_index);

        // `<PropertyGroup>` itself is not a registered object (its
        // children are).
        assert!(project_locator.find(offset_of("<PropertyGroup")).is_none());
    }
}
