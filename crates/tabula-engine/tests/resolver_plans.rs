//! Plan-level properties of dependency resolution

use tabula_core::Value;
use tabula_engine::{
    DependencyResolver, EngineError, ExecutionPlan, FeatureDefinition, FeatureRegistry,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn noop(name: &str, args: &[&str]) -> FeatureDefinition {
    FeatureDefinition::new(name, args.iter().copied(), |_a, _c| Ok(Value::Null))
}

/// A registry shaped like a real model: raw columns qty/price/date, a
/// diamond of derived features, and a shared leaf dependency.
fn model_registry() -> FeatureRegistry {
    let mut registry = FeatureRegistry::new();
    registry.register(None, noop("total", &["qty", "price"]));
    registry.register(None, noop("total_sum", &["total"]));
    registry.register(None, noop("qty_sum", &["qty"]));
    registry.register(None, noop("total_share", &["total", "total_sum"]));
    registry.register(None, noop("density", &["total_share", "qty_sum"]));
    registry
}

fn check_topological_order(plan: &ExecutionPlan, registry: &FeatureRegistry) {
    for (i, feature) in plan.exec_seq.iter().enumerate() {
        let Some(def) = registry.get(feature) else {
            continue;
        };
        for dep in &def.args {
            if let Some(j) = plan.exec_seq.iter().position(|f| f == dep) {
                assert!(
                    j < i,
                    "dependency '{}' of '{}' at index {} does not precede index {}",
                    dep,
                    feature,
                    j,
                    i
                );
            }
        }
    }
}

fn check_disjoint(plan: &ExecutionPlan) {
    for col in &plan.input_cols {
        assert!(
            !plan.exec_seq.contains(col),
            "'{}' appears in both input_cols and exec_seq",
            col
        );
    }
}

#[test]
fn diamond_dependencies_resolve_in_topological_order() {
    let registry = model_registry();
    let resolver = DependencyResolver::new(&registry);

    let plan = resolver
        .resolve(
            &strings(&["density"]),
            &strings(&["qty", "price", "date"]),
            &[],
            &[],
        )
        .unwrap();

    check_topological_order(&plan, &registry);
    check_disjoint(&plan);

    assert_eq!(plan.input_cols, strings(&["qty", "price"]));
    assert_eq!(
        plan.exec_seq,
        strings(&["total", "total_sum", "total_share", "qty_sum", "density"])
    );
}

#[test]
fn every_output_order_preserves_topology() {
    let registry = model_registry();
    let resolver = DependencyResolver::new(&registry);
    let available = strings(&["qty", "price", "date"]);

    // Requesting outputs in any order keeps the plan topological
    for outputs in [
        vec!["density", "total"],
        vec!["total", "density"],
        vec!["total_share", "density", "qty_sum"],
        vec!["qty_sum", "total_sum", "total_share"],
    ] {
        let plan = resolver
            .resolve(&strings(&outputs), &available, &[], &[])
            .unwrap();
        check_topological_order(&plan, &registry);
        check_disjoint(&plan);

        // Requested features always make it into the plan
        for output in &outputs {
            assert!(plan.exec_seq.iter().any(|f| f == output));
        }
    }
}

#[test]
fn requested_raw_column_stays_out_of_exec_seq() {
    let registry = model_registry();
    let resolver = DependencyResolver::new(&registry);

    let plan = resolver
        .resolve(
            &strings(&["qty", "total"]),
            &strings(&["qty", "price"]),
            &[],
            &[],
        )
        .unwrap();

    check_disjoint(&plan);
    assert!(plan.input_cols.contains(&"qty".to_string()));
    assert!(!plan.exec_seq.contains(&"qty".to_string()));
}

#[test]
fn group_by_column_resolves_to_neither_list() {
    let registry = model_registry();
    let resolver = DependencyResolver::new(&registry);

    let mut registry2 = model_registry();
    registry2.register(None, noop("per_day", &["date", "total"]));
    let resolver2 = DependencyResolver::new(&registry2);

    let plan = resolver2
        .resolve(
            &strings(&["per_day"]),
            &strings(&["qty", "price", "date"]),
            &strings(&["date"]),
            &[],
        )
        .unwrap();

    assert!(!plan.input_cols.contains(&"date".to_string()));
    assert!(!plan.exec_seq.contains(&"date".to_string()));

    // Without grouping, the same column is a plain input
    let plan = resolver
        .resolve(
            &strings(&["date"]),
            &strings(&["qty", "price", "date"]),
            &[],
            &[],
        )
        .unwrap();
    assert!(plan.input_cols.contains(&"date".to_string()));
}

#[test]
fn unknown_dependency_degrades_to_input_column() {
    let mut registry = model_registry();
    registry.register(None, noop("adjusted", &["total", "correction"]));
    let resolver = DependencyResolver::new(&registry);

    let plan = resolver
        .resolve(
            &strings(&["adjusted"]),
            &strings(&["qty", "price"]),
            &[],
            &[],
        )
        .unwrap();

    // "correction" is neither available nor registered: assumed raw column
    assert!(plan.input_cols.contains(&"correction".to_string()));
    assert!(!plan.exec_seq.contains(&"correction".to_string()));
    check_topological_order(&plan, &registry);
}

#[test]
fn deep_cycle_is_rejected() {
    let mut registry = FeatureRegistry::new();
    registry.register(None, noop("a", &["b"]));
    registry.register(None, noop("b", &["c"]));
    registry.register(None, noop("c", &["a"]));
    let resolver = DependencyResolver::new(&registry);

    let err = resolver
        .resolve(&strings(&["a"]), &[], &[], &[])
        .unwrap_err();

    match err {
        EngineError::CircularDependency(path) => {
            assert!(path.contains("a"));
            assert!(path.contains("b"));
            assert!(path.contains("c"));
        }
        other => panic!("Expected CircularDependency, got {other:?}"),
    }
}

#[test]
fn external_sources_partition_input_cols() {
    let mut registry = FeatureRegistry::new();
    registry.register(
        None,
        noop(
            "blend",
            &["qty", "daily_attrs_qty_sum", "monthly_attrs_total"],
        ),
    );
    let resolver = DependencyResolver::new(&registry);

    let plan = resolver
        .resolve(
            &strings(&["blend"]),
            &strings(&["qty", "daily_attrs_qty_sum", "monthly_attrs_total"]),
            &[],
            &strings(&["daily_attrs", "monthly_attrs"]),
        )
        .unwrap();

    assert_eq!(
        plan.external.by_source["daily_attrs"],
        strings(&["qty_sum"])
    );
    assert_eq!(
        plan.external.by_source["monthly_attrs"],
        strings(&["total"])
    );
    assert!(plan.external.contains("daily_attrs_qty_sum"));
    assert!(!plan.external.contains("qty"));
}

#[test]
fn plan_serializes_round_trip() {
    let registry = model_registry();
    let resolver = DependencyResolver::new(&registry);

    let plan = resolver
        .resolve(
            &strings(&["density"]),
            &strings(&["qty", "price"]),
            &[],
            &[],
        )
        .unwrap();

    let json = serde_json::to_string(&plan).unwrap();
    let restored: ExecutionPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.input_cols, plan.input_cols);
    assert_eq!(restored.exec_seq, plan.exec_seq);
}
