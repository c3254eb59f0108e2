//! End-to-end tests for the object and data property hierarchies.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use onto_hierarchy::{
    Axiom, ClassHierarchy, DataPropertyHierarchy, Entity, EntitySet, Error, HierarchyConfig,
    HierarchyListener, HierarchyProvider, ListenerError, ObjectPropertyExpression,
    ObjectPropertyHierarchy, OntologyChange, OntologyId, OntologyManager,
};

// ============================================================================
// Helpers
// ============================================================================

fn prop(name: &str) -> Entity {
    Entity::object_property(format!("http://example.org/rel#{name}")).unwrap()
}

fn data(name: &str) -> Entity {
    Entity::data_property(format!("http://example.org/rel#{name}")).unwrap()
}

fn set(entities: &[Entity]) -> EntitySet {
    entities.iter().cloned().collect()
}

fn manager_with(axioms: Vec<Axiom>) -> (Arc<OntologyManager>, OntologyId) {
    let manager = Arc::new(OntologyManager::new());
    let id = OntologyId::new("http://example.org/rel").unwrap();
    manager.create_ontology(id.clone()).unwrap();
    let changes = axioms.into_iter().map(|a| OntologyChange::add_axiom(&id, a)).collect();
    manager.apply_changes(changes).unwrap();
    (manager, id)
}

fn object_hierarchy(manager: &Arc<OntologyManager>) -> ObjectPropertyHierarchy {
    let h = ObjectPropertyHierarchy::new(manager.clone(), HierarchyConfig::default()).unwrap();
    h.set_ontologies(manager.ontologies()).unwrap();
    h
}

#[derive(Default)]
struct Recorder {
    nodes: Mutex<Vec<Entity>>,
}

impl HierarchyListener for Recorder {
    fn node_changed(&self, entity: &Entity) -> Result<(), ListenerError> {
        self.nodes.lock().push(entity.clone());
        Ok(())
    }

    fn hierarchy_changed(&self) -> Result<(), ListenerError> {
        Ok(())
    }
}

// ============================================================================
// 1. Scenario C: a two-property cycle
// ============================================================================

#[test]
fn test_mutual_sub_properties_are_roots_and_equivalent() {
    let (manager, _id) = manager_with(vec![
        Axiom::sub_object_property_of(prop("P1"), prop("P2")),
        Axiom::sub_object_property_of(prop("P2"), prop("P1")),
    ]);
    let h = object_hierarchy(&manager);

    assert_eq!(h.roots().unwrap(), set(&[Entity::top_object_property(), prop("P1"), prop("P2")]));
    assert_eq!(h.equivalents(&prop("P1")).unwrap(), set(&[prop("P2")]));
    assert_eq!(h.equivalents(&prop("P2")).unwrap(), set(&[prop("P1")]));
    assert!(h.has_root(&prop("P1")).unwrap());
    assert_eq!(h.paths_to_root(&prop("P1")).unwrap(), vec![vec![prop("P1")]]);
}

#[test]
fn test_breaking_the_cycle_demotes_one_side() {
    let (manager, id) = manager_with(vec![
        Axiom::sub_object_property_of(prop("P1"), prop("P2")),
        Axiom::sub_object_property_of(prop("P2"), prop("P1")),
    ]);
    let h = object_hierarchy(&manager);
    let recorder = Arc::new(Recorder::default());
    h.add_listener(recorder.clone());

    manager
        .apply_changes(vec![OntologyChange::remove_axiom(
            &id,
            Axiom::sub_object_property_of(prop("P2"), prop("P1")),
        )])
        .unwrap();

    assert_eq!(h.roots().unwrap(), set(&[Entity::top_object_property(), prop("P2")]));
    assert!(h.equivalents(&prop("P1")).unwrap().is_empty());
    assert_eq!(h.parents(&prop("P1")).unwrap(), set(&[prop("P2")]));
    assert_eq!(h.children(&prop("P2")).unwrap(), set(&[prop("P1")]));

    let notified: EntitySet = recorder.nodes.lock().iter().cloned().collect();
    assert!(notified.contains(&prop("P1")));
    assert!(notified.contains(&Entity::top_object_property()));
}

#[test]
fn test_three_cycle_with_a_hanging_sub_property() {
    let (manager, _id) = manager_with(vec![
        Axiom::sub_object_property_of(prop("P"), prop("Q")),
        Axiom::sub_object_property_of(prop("Q"), prop("R")),
        Axiom::sub_object_property_of(prop("R"), prop("P")),
        Axiom::sub_object_property_of(prop("S"), prop("P")),
    ]);
    let h = object_hierarchy(&manager);

    assert_eq!(
        h.roots().unwrap(),
        set(&[Entity::top_object_property(), prop("P"), prop("Q"), prop("R")])
    );
    assert_eq!(h.equivalents(&prop("P")).unwrap(), set(&[prop("Q"), prop("R")]));
    assert_eq!(h.descendants(&prop("P")).unwrap(), set(&[prop("S")]));
    assert_eq!(h.paths_to_root(&prop("S")).unwrap(), vec![vec![prop("P"), prop("S")]]);
    assert!(!h.has_root(&prop("S")).unwrap());
}

// ============================================================================
// 2. The top property and root-level properties
// ============================================================================

#[test]
fn test_top_property_is_always_a_root() {
    let (manager, _id) = manager_with(vec![]);
    let h = object_hierarchy(&manager);
    let top = Entity::top_object_property();

    assert_eq!(h.roots().unwrap(), set(&[top.clone()]));
    assert!(h.has_root(&top).unwrap());
    assert!(h.parents(&top).unwrap().is_empty());
    assert!(h.contains_reference(&top).unwrap());
    assert_eq!(h.paths_to_root(&top).unwrap(), vec![vec![top]]);
}

#[test]
fn test_explicit_top_super_property_keeps_root_level() {
    let (manager, _id) = manager_with(vec![
        Axiom::sub_object_property_of(prop("hasPart"), Entity::top_object_property()),
        Axiom::sub_object_property_of(prop("hasWheel"), prop("hasPart")),
    ]);
    let h = object_hierarchy(&manager);
    let top = Entity::top_object_property();

    assert_eq!(h.roots().unwrap(), set(&[top.clone(), prop("hasPart")]));
    assert_eq!(h.children(&top).unwrap(), set(&[prop("hasPart")]));
    assert_eq!(h.parents(&prop("hasPart")).unwrap(), set(&[top.clone()]));
    assert_eq!(h.ancestors(&prop("hasWheel")).unwrap(), set(&[prop("hasPart"), top]));
}

#[test]
fn test_inverse_sub_property_asserts_no_edge() {
    let (manager, _id) = manager_with(vec![Axiom::SubObjectPropertyOf {
        sub: ObjectPropertyExpression::InverseOf(prop("partOf")),
        sup: ObjectPropertyExpression::ObjectProperty(prop("related")),
    }]);
    let h = object_hierarchy(&manager);

    assert_eq!(
        h.roots().unwrap(),
        set(&[Entity::top_object_property(), prop("partOf"), prop("related")])
    );
    assert!(h.children(&prop("related")).unwrap().is_empty());
}

#[test]
fn test_every_root_answers_has_root() {
    let (manager, _id) = manager_with(vec![
        Axiom::sub_object_property_of(prop("A"), prop("B")),
        Axiom::sub_object_property_of(prop("C"), prop("C")),
        Axiom::declaration(prop("D")),
    ]);
    let h = object_hierarchy(&manager);
    let roots = h.roots().unwrap();
    assert_eq!(roots, set(&[Entity::top_object_property(), prop("B"), prop("C"), prop("D")]));
    for e in [prop("A"), prop("B"), prop("C"), prop("D"), prop("Unused")] {
        assert_eq!(h.has_root(&e).unwrap(), roots.contains(&e), "{e}");
    }
}

// ============================================================================
// 3. Data properties
// ============================================================================

#[test]
fn test_data_property_chain() {
    let (manager, id) = manager_with(vec![
        Axiom::sub_data_property_of(data("birthYear"), data("dateProperty")),
    ]);
    let h = DataPropertyHierarchy::new(manager.clone(), HierarchyConfig::default()).unwrap();
    h.set_ontologies(manager.ontologies()).unwrap();
    let top = Entity::top_data_property();

    assert_eq!(h.roots().unwrap(), set(&[top.clone(), data("dateProperty")]));
    assert_eq!(h.children(&top).unwrap(), set(&[data("dateProperty")]));
    assert_eq!(h.parents(&data("birthYear")).unwrap(), set(&[data("dateProperty")]));

    manager
        .apply_changes(vec![OntologyChange::add_axiom(
            &id,
            Axiom::sub_data_property_of(data("dateProperty"), data("birthYear")),
        )])
        .unwrap();
    assert_eq!(h.roots().unwrap(), set(&[top, data("dateProperty"), data("birthYear")]));
    assert_eq!(h.equivalents(&data("birthYear")).unwrap(), set(&[data("dateProperty")]));
}

// ============================================================================
// 4. Kind separation
// ============================================================================

#[test]
fn test_wrong_kind_is_rejected() {
    let (manager, _id) = manager_with(vec![]);
    let h = object_hierarchy(&manager);
    let result = h.parents(&data("age"));
    assert!(matches!(result, Err(Error::KindMismatch { .. })));
    assert!(matches!(h.children(&Entity::thing()), Err(Error::KindMismatch { .. })));
}

#[test]
fn test_class_edits_do_not_reach_property_listeners() {
    let (manager, id) = manager_with(vec![Axiom::declaration(prop("p"))]);
    let props = object_hierarchy(&manager);
    let classes = ClassHierarchy::new(manager.clone(), HierarchyConfig::default()).unwrap();
    classes.set_ontologies(manager.ontologies()).unwrap();

    let recorder = Arc::new(Recorder::default());
    props.add_listener(recorder.clone());

    let animal = Entity::class("http://example.org/rel#Animal").unwrap();
    let dog = Entity::class("http://example.org/rel#Dog").unwrap();
    manager
        .apply_changes(vec![OntologyChange::add_axiom(&id, Axiom::sub_class_of(dog.clone(), animal.clone()))])
        .unwrap();

    assert!(recorder.nodes.lock().is_empty());
    assert_eq!(classes.parents(&dog).unwrap(), set(&[animal]));
    assert_eq!(props.roots().unwrap(), set(&[Entity::top_object_property(), prop("p")]));
}
