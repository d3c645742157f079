//! 端到端分析场景

use di_abstractions::{
    BaseReference, ComponentDeclaration, ComponentFlags, ConditionDeclaration, ContradictionReason, Exposure,
    Finding, FindingKind, InstanceSharing, PredicateNode, RedundancyScope, RegistrationKind, Severity,
    StructuralReason,
};
use di_impl_integration_tests::{analyze, ty};
use infrastructure_common::{ComponentId, Lifetime};
use std::collections::HashMap;

fn id(text: &str) -> ComponentId {
    ComponentId::new(text)
}

#[test]
fn test_leaf_redeclaring_root_dependency() {
    let declarations = vec![
        ComponentDeclaration::new("Root")
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("IAlpha"), ty("IBeta")]),
        ComponentDeclaration::new("Middle")
            .with_base(BaseReference::new("Root"))
            .with_flags(ComponentFlags::abstract_base())
            .with_field(ty("IGamma")),
        ComponentDeclaration::new("Leaf")
            .with_base(BaseReference::new("Middle"))
            .with_lifetime(Lifetime::Scoped)
            .with_bulk([ty("IAlpha")])
            .with_field(ty("IDelta")),
    ];

    let (output, sink) = analyze(declarations);

    assert_eq!(
        sink.findings(),
        &[Finding::RedundancyWarning {
            component: id("Leaf"),
            dependency: ty("IAlpha"),
            scope: RedundancyScope::Inherited { ancestor: id("Root") },
        }]
    );

    assert_eq!(output.flattened_types(&id("Leaf")), vec!["IAlpha", "IBeta", "IGamma", "IDelta"]);

    let plan = &output.constructors[&id("Leaf")];
    assert_eq!(plan.own_names(), vec!["delta"]);
    assert_eq!(plan.forwarded, vec!["alpha", "beta", "gamma"]);
    assert_eq!(plan.locally_assigned, vec!["delta"]);

    let middle = &output.constructors[&id("Middle")];
    assert_eq!(middle.parameter_names(), vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_singleton_depending_on_scoped_is_fatal() {
    let declarations = vec![
        ComponentDeclaration::new("X")
            .with_lifetime(Lifetime::Singleton)
            .with_contract(ty("IX"))
            .with_exposure(Exposure::AllContracts)
            .with_bulk([ty("IY")]),
        ComponentDeclaration::new("Y")
            .with_lifetime(Lifetime::Scoped)
            .with_contract(ty("IY"))
            .with_exposure(Exposure::AllContracts),
    ];

    let (output, sink) = analyze(declarations);

    let violations = sink.of_kind(FindingKind::LifetimeViolation);
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0],
        &Finding::LifetimeViolation {
            component: id("X"),
            dependency: id("Y"),
            dependency_type: ty("IY"),
            component_lifetime: Lifetime::Singleton,
            dependency_lifetime: Lifetime::Scoped,
            inherited: false,
        }
    );
    assert!(violations[0].is_fatal());

    assert!(output.registrations_for(&id("X")).is_empty());
    assert_eq!(output.registrations_for(&id("Y")).len(), 2);
    assert!(output.constructors.contains_key(&id("X")));
}

#[test]
fn test_singleton_may_depend_on_host_managed_and_singleton() {
    let declarations = vec![
        ComponentDeclaration::new("Cache")
            .with_lifetime(Lifetime::Singleton)
            .with_bulk([ty("IHostClock"), ty("ISettings")]),
        ComponentDeclaration::new("HostClock")
            .with_lifetime(Lifetime::HostManaged)
            .with_contract(ty("IHostClock"))
            .with_exposure(Exposure::AllContracts),
        ComponentDeclaration::new("Settings")
            .with_lifetime(Lifetime::Singleton)
            .with_contract(ty("ISettings"))
            .with_exposure(Exposure::AllContracts),
    ];

    let (output, sink) = analyze(declarations);

    assert!(sink.findings().is_empty(), "{:?}", sink.findings());
    assert_eq!(output.registrations_for(&id("Cache")).len(), 1);
}

#[test]
fn test_inherited_lifetime_violation_is_advisory() {
    let declarations = vec![
        ComponentDeclaration::new("Base")
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("ISession")]),
        ComponentDeclaration::new("Derived")
            .with_base(BaseReference::new("Base"))
            .with_lifetime(Lifetime::Singleton),
        ComponentDeclaration::new("Session")
            .with_lifetime(Lifetime::Transient)
            .with_contract(ty("ISession"))
            .with_exposure(Exposure::AllContracts),
    ];

    let (output, sink) = analyze(declarations);

    let violations = sink.of_kind(FindingKind::LifetimeViolation);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity(), Severity::Advisory);
    assert!(!sink.has_fatal());
    assert_eq!(output.registrations_for(&id("Derived")).len(), 1);
}

#[test]
fn test_redeclared_inherited_dependency_keeps_violation_fatal() {
    let declarations = vec![
        ComponentDeclaration::new("Base")
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("ISession")]),
        ComponentDeclaration::new("Derived")
            .with_base(BaseReference::new("Base"))
            .with_lifetime(Lifetime::Singleton)
            .with_bulk([ty("ISession")]),
        ComponentDeclaration::new("Session")
            .with_lifetime(Lifetime::Transient)
            .with_contract(ty("ISession"))
            .with_exposure(Exposure::AllContracts),
    ];

    let (output, sink) = analyze(declarations);

    assert_eq!(sink.of_kind(FindingKind::RedundancyWarning).len(), 1);
    let violations = sink.of_kind(FindingKind::LifetimeViolation);
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0],
        &Finding::LifetimeViolation {
            component: id("Derived"),
            dependency: id("Session"),
            dependency_type: ty("ISession"),
            component_lifetime: Lifetime::Singleton,
            dependency_lifetime: Lifetime::Transient,
            inherited: false,
        }
    );
    assert!(sink.has_fatal());
    assert!(output.registrations_for(&id("Derived")).is_empty());
}

#[test]
fn test_shared_instance_forwards_contracts() {
    let declarations = vec![ComponentDeclaration::new("Gateway")
        .with_lifetime(Lifetime::Scoped)
        .with_contract(ty("I1"))
        .with_contract(ty("I2"))
        .with_exposure(Exposure::AllContracts)
        .with_sharing(InstanceSharing::Shared)];

    let (output, sink) = analyze(declarations);
    assert!(sink.findings().is_empty());

    let entries = output.registrations_for(&id("Gateway"));
    let kinds: Vec<RegistrationKind> = entries.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RegistrationKind::Concrete,
            RegistrationKind::Forwarding,
            RegistrationKind::Forwarding
        ]
    );
    let services: Vec<String> = entries.iter().map(|entry| entry.service.to_string()).collect();
    assert_eq!(services, vec!["Gateway", "I1", "I2"]);
    assert!(entries.iter().all(|entry| entry.component == id("Gateway")));
    assert!(entries.iter().all(|entry| entry.lifetime == Lifetime::Scoped));
}

#[test]
fn test_separate_instances_and_exclusions() {
    let declarations = vec![ComponentDeclaration::new("Gateway")
        .with_lifetime(Lifetime::Transient)
        .with_contract(ty("I1"))
        .with_contract(ty("I2"))
        .with_contract(ty("I3"))
        .with_exposure(Exposure::AllContracts)
        .excluding(ty("I3"))
        .excluding(ty("INotImplemented"))];

    let (output, sink) = analyze(declarations);

    assert_eq!(
        sink.findings(),
        &[Finding::UnnecessaryExclusion {
            component: id("Gateway"),
            contract: ty("INotImplemented"),
        }]
    );

    let entries = output.registrations_for(&id("Gateway"));
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|entry| !entry.is_forwarding()));
    assert_eq!(entries[1].kind, RegistrationKind::Independent);
    assert_eq!(entries[2].service, ty("I2"));
}

#[test]
fn test_inheritance_cycle_blocks_descendants() {
    let declarations = vec![
        ComponentDeclaration::new("A").with_base(BaseReference::new("B")),
        ComponentDeclaration::new("B").with_base(BaseReference::new("A")),
        ComponentDeclaration::new("C")
            .with_base(BaseReference::new("A"))
            .with_lifetime(Lifetime::Scoped),
        ComponentDeclaration::new("D")
            .with_base(BaseReference::new("Missing"))
            .with_lifetime(Lifetime::Scoped),
        ComponentDeclaration::new("Healthy").with_lifetime(Lifetime::Scoped),
    ];

    let (output, sink) = analyze(declarations);

    let reasons: Vec<(&str, &StructuralReason)> = sink
        .findings()
        .iter()
        .filter_map(|finding| match finding {
            Finding::StructuralError { component, reason } => Some((component.as_str(), reason)),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            (
                "A",
                &StructuralReason::InheritanceCycle {
                    chain: vec![id("A"), id("B")]
                }
            ),
            (
                "B",
                &StructuralReason::InheritanceCycle {
                    chain: vec![id("B"), id("A")]
                }
            ),
            ("C", &StructuralReason::BrokenAncestor { ancestor: id("A") }),
            ("D", &StructuralReason::MissingBase { base: id("Missing") }),
        ]
    );

    assert_eq!(output.constructors.keys().collect::<Vec<_>>(), vec![&id("Healthy")]);
    assert_eq!(output.registrations.len(), 1);
}

#[test]
fn test_dependency_cycle_between_concrete_components() {
    let declarations = vec![
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
    ];

    let (output, sink) = analyze(declarations);

    assert_eq!(
        sink.findings(),
        &[Finding::CycleWarning {
            cycle: vec![id("Ping"), id("Pong")]
        }]
    );
    assert_eq!(output.registrations.len(), 4);
}

#[test]
fn test_generic_base_closes_over_type_arguments() {
    let declarations = vec![
        ComponentDeclaration::new("RepositoryBase")
            .with_type_params(["T"])
            .with_flags(ComponentFlags::abstract_base())
            .with_bulk([ty("ILogger<T>"), ty("IStore<T>")]),
        ComponentDeclaration::new("OrderRepository")
            .with_base(BaseReference::generic("RepositoryBase", vec![ty("Order")]))
            .with_lifetime(Lifetime::Scoped)
            .with_field(ty("IStore<Order>")),
        ComponentDeclaration::new("BrokenRepository")
            .with_base(BaseReference::generic("RepositoryBase", vec![]))
            .with_lifetime(Lifetime::Scoped),
    ];

    let (output, sink) = analyze(declarations);

    assert_eq!(
        output.flattened_types(&id("OrderRepository")),
        vec!["ILogger<Order>", "IStore<Order>"]
    );
    let plan = &output.constructors[&id("OrderRepository")];
    assert!(plan.own.is_empty());
    assert_eq!(plan.forwarded, vec!["orderLogger", "orderStore"]);

    assert_eq!(sink.of_kind(FindingKind::RedundancyWarning).len(), 1);
    assert!(sink.findings().contains(&Finding::StructuralError {
        component: id("BrokenRepository"),
        reason: StructuralReason::BaseArityMismatch {
            base: id("RepositoryBase"),
            expected: 1,
            actual: 0,
        },
    }));
}

#[test]
fn test_conditional_registrations() {
    let declarations = vec![
        ComponentDeclaration::new("RedisCache")
            .with_lifetime(Lifetime::Singleton)
            .with_contract(ty("ICache"))
            .with_exposure(Exposure::AllContracts)
            .with_condition(ConditionDeclaration::new().with_config_key("Cache:Provider").equals("redis")),
        ComponentDeclaration::new("MemoryCache")
            .with_lifetime(Lifetime::Singleton)
            .with_contract(ty("ICache"))
            .with_exposure(Exposure::AllContracts)
            .with_condition(
                ConditionDeclaration::new()
                    .with_config_key("Cache:Provider")
                    .not_equals("redis"),
            ),
        ComponentDeclaration::new("DebugProbe")
            .with_lifetime(Lifetime::Transient)
            .with_condition(ConditionDeclaration::new().allow_environment("Development"))
            .with_condition(ConditionDeclaration::new().with_config_key("Probe").equals("on")),
    ];

    let (output, sink) = analyze(declarations);

    assert_eq!(
        sink.findings(),
        &[Finding::ConditionContradiction {
            component: id("DebugProbe"),
            reason: ContradictionReason::AmbiguousConditions { declarations: 2 },
        }]
    );
    assert!(output.registrations_for(&id("DebugProbe")).is_empty());

    let redis = output.registrations_for(&id("RedisCache"));
    assert_eq!(
        redis[0].predicate,
        Some(PredicateNode::config_equals("Cache:Provider", "redis"))
    );

    let mut config = HashMap::new();
    config.insert("Cache:Provider".to_string(), "Redis".to_string());
    let active: Vec<&str> = output
        .registrations
        .iter()
        .filter(|entry| entry.predicate.as_ref().map_or(true, |p| p.evaluate("Production", &config)))
        .map(|entry| entry.component.as_str())
        .collect();
    assert_eq!(active, vec!["RedisCache", "RedisCache"]);

    let without_key: HashMap<String, String> = HashMap::new();
    let memory = output.registrations_for(&id("MemoryCache"));
    assert!(memory.iter().all(|entry| entry
        .predicate
        .as_ref()
        .is_some_and(|p| p.evaluate("Production", &without_key))));
}
