//! 合并与计划输出的不变量测试

use di_abstractions::{
    BaseReference, ComponentDeclaration, ComponentFlags, ConditionDeclaration, DependencyOrigin, Exposure,
    FindingKind, InstanceSharing,
};
use di_impl_integration_tests::{analyze, ty};
use infrastructure_common::{ComponentId, Lifetime};
use std::collections::BTreeSet;

fn chain() -> Vec<ComponentDeclaration> {
    vec![
        ComponentDeclaration::new("A")
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("IA1"), ty("IA2")]),
        ComponentDeclaration::new("B")
            .with_base(BaseReference::new("A"))
            .with_flags(ComponentFlags::abstract_base())
            .with_field(ty("IB1"))
            .with_bulk([ty("IB2")]),
        ComponentDeclaration::new("C")
            .with_base(BaseReference::new("B"))
            .with_lifetime(Lifetime::Scoped)
            .with_bulk([ty("IC1")]),
    ]
}

/// 一个较大的目录，覆盖诊断的各个来源
fn mixed_catalog() -> Vec<ComponentDeclaration> {
    let mut declarations = chain();
    declarations.extend([
        ComponentDeclaration::new("Cache")
            .with_lifetime(Lifetime::Singleton)
            .with_field(ty("ISession")),
        ComponentDeclaration::new("Session")
            .with_lifetime(Lifetime::Scoped)
            .with_contract(ty("ISession"))
            .with_exposure(Exposure::AllContracts)
            .with_bulk([ty("IClock"), ty("IClock")])
            .excluding(ty("IMissing")),
        ComponentDeclaration::new("Feature")
            .with_lifetime(Lifetime::Transient)
            .with_condition(ConditionDeclaration::new().allow_environment("Dev").deny_environment("dev")),
        ComponentDeclaration::new("Ping")
            .with_lifetime(Lifetime::Scoped)
            .with_contract(ty("IPing"))
            .with_exposure(Exposure::AllContracts)
            .with_field(ty("IPong")),
        ComponentDeclaration::new("Pong")
            .with_lifetime(Lifetime::Scoped)
            .with_contract(ty("IPong"))
            .with_exposure(Exposure::AllContracts)
            .with_field(ty("IPing")),
        ComponentDeclaration::new("Shared")
            .with_lifetime(Lifetime::Singleton)
            .with_contract(ty("I1"))
            .with_contract(ty("I2"))
            .with_exposure(Exposure::AllContracts)
            .with_sharing(InstanceSharing::Shared),
    ]);
    declarations
}

#[test]
fn test_repeated_runs_are_identical() {
    let (first, first_sink) = analyze(mixed_catalog());
    let (second, second_sink) = analyze(mixed_catalog());

    assert_eq!(first, second);
    assert_eq!(first_sink, second_sink);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        serde_json::to_string(first_sink.findings()).unwrap(),
        serde_json::to_string(second_sink.findings()).unwrap()
    );

    // 目录覆盖了每一种非结构性诊断
    for kind in [
        FindingKind::RedundancyWarning,
        FindingKind::LifetimeViolation,
        FindingKind::ConditionContradiction,
        FindingKind::UnnecessaryExclusion,
        FindingKind::CycleWarning,
    ] {
        assert!(!first_sink.of_kind(kind).is_empty(), "缺少 {kind:?}");
    }
}

#[test]
fn test_declaration_order_does_not_change_output() {
    let (forward, forward_sink) = analyze(mixed_catalog());
    let mut reversed = mixed_catalog();
    reversed.reverse();
    let (backward, backward_sink) = analyze(reversed);

    assert_eq!(forward, backward);
    assert_eq!(forward_sink, backward_sink);
}

#[test]
fn test_descendant_list_extends_ancestor_lists() {
    let (output, sink) = analyze(chain());
    assert!(sink.findings().is_empty());

    let a = output.flattened_types(&ComponentId::new("A"));
    let b = output.flattened_types(&ComponentId::new("B"));
    let c = output.flattened_types(&ComponentId::new("C"));

    assert_eq!(a, vec!["IA1", "IA2"]);
    assert_eq!(b, vec!["IA1", "IA2", "IB2", "IB1"]);
    assert_eq!(c, vec!["IA1", "IA2", "IB2", "IB1", "IC1"]);
    assert!(c.starts_with(&a));
    assert!(c.starts_with(&b));

    let declared_by: Vec<&str> = output.flattened[&ComponentId::new("C")]
        .iter()
        .map(|entry| entry.declared_by.as_str())
        .collect();
    assert_eq!(declared_by, vec!["A", "A", "B", "B", "C"]);
}

#[test]
fn test_each_type_appears_once_per_component() {
    let declarations = vec![
        ComponentDeclaration::new("Root")
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("IClock"), ty("ILogger"), ty("IClock")])
            .with_field(ty("ILogger")),
        ComponentDeclaration::new("Mid")
            .with_base(BaseReference::new("Root"))
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("IClock")])
            .with_bulk([ty("IClock"), ty("IStore")])
            .with_field(ty("IStore")),
        ComponentDeclaration::new("Leaf")
            .with_base(BaseReference::new("Mid"))
            .with_lifetime(Lifetime::Transient)
            .with_field(ty("IClock"))
            .with_field(ty("IClock"))
            .with_bulk([ty("ILogger"), ty("IStore"), ty("IQueue")]),
    ];

    let (output, sink) = analyze(declarations);

    for (id, entries) in &output.flattened {
        let unique: BTreeSet<String> = entries.iter().map(|entry| entry.type_ref().to_string()).collect();
        assert_eq!(unique.len(), entries.len(), "{id} 的展开列表中有重复类型");
    }
    assert_eq!(
        output.flattened_types(&ComponentId::new("Leaf")),
        vec!["IClock", "ILogger", "IStore", "IQueue"]
    );
    assert!(!sink.of_kind(FindingKind::RedundancyWarning).is_empty());
}

#[test]
fn test_field_declaration_wins_over_bulk() {
    let declarations = vec![ComponentDeclaration::new("Service")
        .with_lifetime(Lifetime::Scoped)
        .with_bulk([ty("IClock"), ty("IStore")])
        .with_field(ty("IClock"))];

    let (output, sink) = analyze(declarations);

    let conflicts = sink.of_kind(FindingKind::ConflictWarning);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(sink.findings().len(), 1);

    let entries = &output.flattened[&ComponentId::new("Service")];
    let clock: Vec<_> = entries
        .iter()
        .filter(|entry| entry.type_ref().to_string() == "IClock")
        .collect();
    assert_eq!(clock.len(), 1);
    assert_eq!(clock[0].spec.origin, DependencyOrigin::FieldDeclared);
}
