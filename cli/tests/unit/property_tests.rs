//! Property-based tests for inventory rendering, variable merging and
//! generated identifiers.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;

use proptest::prelude::*;

use kubetest2_tf::domain::inventory::{Inventory, Role, parse_role_output};
use kubetest2_tf::domain::kubeconfig::rewrite_server_url;
use kubetest2_tf::domain::vars::{CommonVars, merge_extra_vars};
use kubetest2_tf::domain::workspace::{
    generate_bootstrap_token, generate_cluster_name, validate_cluster_name,
};

fn address() -> impl Strategy<Value = String> {
    (1u8..=254, 0u8..=255, 0u8..=255, 1u8..=254).prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
}

proptest! {
    /// Rendering keeps every address, in discovery order, under its role.
    #[test]
    fn prop_render_preserves_order(
        masters in prop::collection::vec(address(), 0..5),
        workers in prop::collection::vec(address(), 0..5),
    ) {
        let mut inv = Inventory::new();
        inv.extend(Role::Masters, masters.clone());
        inv.extend(Role::Workers, workers.clone());

        let mut expected = String::from("[masters]\n");
        for m in &masters {
            expected.push_str(m);
            expected.push('\n');
        }
        expected.push_str("\n[workers]\n");
        for w in &workers {
            expected.push_str(w);
            expected.push('\n');
        }
        expected.push('\n');
        prop_assert_eq!(inv.render(), expected);
    }

    /// A JSON list of addresses parses back to the same list.
    #[test]
    fn prop_role_output_parses_string_lists(hosts in prop::collection::vec(address(), 0..8)) {
        let json = serde_json::to_vec(&hosts).expect("json");
        prop_assert_eq!(parse_role_output(Role::Workers, &json).expect("parse"), hosts);
    }

    /// Every user key wins, every untouched generated key survives.
    #[test]
    fn prop_merge_is_last_write_wins(
        extra in prop::collection::btree_map("[a-z_]{1,12}", "[a-zA-Z0-9./-]{0,12}", 0..6),
    ) {
        let base = CommonVars {
            cluster_name: "demo".to_string(),
            ..CommonVars::default()
        };
        let merged = merge_extra_vars(&base, &extra).expect("merge");
        let generated = serde_json::to_value(&base).expect("json");
        let generated = generated.as_object().expect("object");

        for (key, value) in &extra {
            prop_assert_eq!(merged.get(key).and_then(|v| v.as_str()), Some(value.as_str()));
        }
        for (key, value) in generated {
            if !extra.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
    }

    /// Only the host changes; scheme and port are kept.
    #[test]
    fn prop_rewrite_keeps_scheme_and_port(
        old in address(),
        new in address(),
        port in 1u16..=65535,
        secure in any::<bool>(),
    ) {
        let scheme = if secure { "https" } else { "http" };
        let raw = format!("{scheme}://{old}:{port}");
        prop_assert_eq!(
            rewrite_server_url(&raw, &new).expect("rewrite"),
            format!("{scheme}://{new}:{port}")
        );
    }

    /// Generated identifiers have the shapes downstream tools expect.
    #[test]
    fn prop_generated_identifiers_are_valid(_seed in 0u32..50) {
        let name = generate_cluster_name();
        prop_assert!(validate_cluster_name(&name).is_ok(), "invalid name: {}", name);

        let token = generate_bootstrap_token();
        let (id, secret) = token.split_once('.').expect("dot");
        prop_assert_eq!(id.len(), 6);
        prop_assert_eq!(secret.len(), 16);
        prop_assert!(token.chars().all(|c| c == '.' || c.is_ascii_hexdigit()));
    }
}

#[test]
fn merge_overrides_generated_region() {
    #[derive(serde::Serialize)]
    struct Vars {
        region: &'static str,
        zone: &'static str,
    }
    let extra = BTreeMap::from([("region".to_string(), "us-east".to_string())]);
    let merged = merge_extra_vars(
        &Vars {
            region: "eu-de",
            zone: "z1",
        },
        &extra,
    )
    .expect("merge");
    assert_eq!(
        serde_json::Value::Object(merged),
        serde_json::json!({"region": "us-east", "zone": "z1"})
    );
}
