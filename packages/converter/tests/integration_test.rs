//! End-to-end tests from Markdown fixtures to YAML and back.
//!
//! `orders.md` describes a small order entry protocol; `reference.yaml`
//! supplies the HandlInst field it uses but does not define.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use mdorchestra_converter::repository::{
    generate_yaml, load_repository, load_repository_file, Member, Repository,
};
use mdorchestra_converter::{convert_markdown, BuildOutput, BuilderConfig, Severity};
use pretty_assertions::assert_eq;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn convert_orders() -> BuildOutput {
    let reference = load_repository_file(&fixture_path("reference.yaml"))
        .expect("Failed to load reference");
    convert_markdown(&load_fixture("orders.md"), BuilderConfig::default(), Some(reference))
        .expect("Conversion failed")
}

/// (kind, name, scenario, id) of every keyed entity.
fn triples(repository: &Repository) -> BTreeSet<(&'static str, String, String, u32)> {
    let mut set = BTreeSet::new();
    for f in &repository.fields {
        set.insert(("field", f.name.clone(), f.scenario.clone(), f.id));
    }
    for c in &repository.code_sets {
        set.insert(("codeSet", c.name.clone(), c.scenario.clone(), c.id));
    }
    for c in &repository.components {
        set.insert(("component", c.name.clone(), c.scenario.clone(), c.id));
    }
    for g in &repository.groups {
        set.insert(("group", g.name.clone(), g.scenario.clone(), g.id));
    }
    for m in &repository.messages {
        set.insert(("message", m.name.clone(), m.scenario.clone(), m.id));
    }
    set
}

#[test]
fn test_metadata() {
    let repository = convert_orders().repository;
    assert_eq!(repository.name, "Orders");
    assert_eq!(repository.version, "1.0");
    assert_eq!(repository.metadata.len(), 2);
    assert_eq!(repository.annotation.0[0].text, "Order entry for a single venue.");
    assert_eq!(repository.categories.len(), 2);
    assert_eq!(repository.sections[1].display_order, Some(2));
    assert_eq!(repository.datatypes.len(), 3);
}

#[test]
fn test_only_duplicate_code_set_is_an_error() {
    let output = convert_orders();
    assert_eq!(output.diagnostics.error_count(), 1, "{:?}", output.diagnostics);
    assert!(output.diagnostics.contains(Severity::Error, "OrdTypeCodeSet"));

    let ord_types: Vec<(&str, usize)> = output
        .repository
        .code_sets
        .iter()
        .filter(|c| c.name == "OrdTypeCodeSet")
        .map(|c| (c.scenario.as_str(), c.codes.len()))
        .collect();
    assert_eq!(ord_types, vec![("base", 2), ("baseDup", 1)]);
}

#[test]
fn test_new_order_single_members_resolved() {
    let repository = convert_orders().repository;
    let message = repository
        .messages
        .iter()
        .find(|m| m.name == "NewOrderSingle")
        .expect("NewOrderSingle");
    assert_eq!(message.id, 14);
    assert_eq!(message.msg_type, "D");
    assert_eq!(message.category.as_deref(), Some("SingleGeneralOrderHandling"));

    let ids: Vec<u32> = message.members.iter().map(Member::id).collect();
    assert_eq!(
        ids,
        vec![11, 21, repository.components[0].id, repository.groups[0].id, 54, 40]
    );
    assert!(ids.iter().all(|id| *id != 0));
    assert_eq!(message.responses[0].message_ref.msg_type, "8");
}

#[test]
fn test_reference_field_copied_once_with_code_set() {
    let repository = convert_orders().repository;
    let handl_inst: Vec<_> = repository
        .fields
        .iter()
        .filter(|f| f.id == 21)
        .collect();
    assert_eq!(handl_inst.len(), 1);
    assert_eq!(handl_inst[0].name, "HandlInst");

    let code_set = repository
        .code_sets
        .iter()
        .find(|c| c.name == "HandlInstCodeSet")
        .expect("HandlInstCodeSet copied");
    assert_eq!(code_set.codes.len(), 2);
    assert!(repository.fields.iter().all(|f| f.name != "Account"));
}

#[test]
fn test_inline_codes_and_group() {
    let repository = convert_orders().repository;
    let side = repository.fields.iter().find(|f| f.id == 54).expect("Side");
    assert_eq!(side.type_name.as_deref(), Some("SideCodeSet"));

    let group = &repository.groups[0];
    assert_eq!(group.category.as_deref(), Some("Common"));
    assert_eq!(group.num_in_group.as_ref().map(|r| r.id), Some(453));
    assert_eq!(group.members.len(), 1);
}

#[test]
fn test_actor_flow_session() {
    let repository = convert_orders().repository;
    let machine = &repository.actors[0].state_machines[0];
    assert_eq!(machine.initial.as_ref().map(|s| s.name.as_str()), Some("New"));
    assert_eq!(machine.states.len(), 2);
    assert_eq!(repository.flows[0].reliability.as_deref(), Some("recoverable"));
    assert_eq!(repository.sessions[0].identifiers[0].name, "SenderCompID");
}

#[test]
fn test_yaml_round_trip_keeps_identities() {
    let repository = convert_orders().repository;
    let yaml = generate_yaml(&repository).expect("Failed to generate YAML");
    let loaded = load_repository(yaml.as_bytes()).expect("Failed to load YAML");
    assert_eq!(triples(loaded.repository()), triples(&repository));
    assert_eq!(loaded.repository(), &repository);
}

#[test]
fn test_conversion_is_deterministic() {
    let first = generate_yaml(&convert_orders().repository).unwrap();
    let second = generate_yaml(&convert_orders().repository).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_broken_document_diagnostics() {
    let output = convert_markdown(&load_fixture("broken.md"), BuilderConfig::default(), None)
        .expect("Conversion failed");
    let diagnostics = &output.diagnostics;
    assert_eq!(diagnostics.error_count(), 3, "{diagnostics:?}");
    assert!(diagnostics.contains(Severity::Error, "2="));
    assert!(diagnostics.contains(Severity::Error, "9999"));
    assert!(diagnostics.contains(Severity::Error, "no initial state"));

    let repository = &output.repository;
    assert_eq!(repository.code_sets[0].codes.len(), 1);
    assert_eq!(repository.components[0].members[0].id(), 9999);
}
