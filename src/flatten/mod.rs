//! Configuration flattening.
//!
//! This module turns a nested stack configuration object into a sorted list
//! of path-addressed assignments. Secret leaves are lifted out into
//! environment bindings so that their values never appear on a command line.
//! Rendering assignments into CLI commands lives in [`render`].

mod render;

use std::collections::BTreeMap;
use tracing::debug;

use crate::property::path::{push_index, push_key};
use crate::property::{PropertyMap, PropertyValue};
use crate::secrets::SecretValue;

pub use render::{render_config_commands, shell_quote};

/// Prefix of the environment binding holding a lifted secret.
pub const PLACEHOLDER_PREFIX: &str = "PLACEHOLDER_";

/// One primitive configuration value at a config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigAssignment {
    /// Config path, e.g. `aws:region` or `app.hosts[0]`.
    pub path: String,
    /// Literal value, or the binding name for secrets.
    pub value: String,
    /// Whether the value is secret.
    pub is_secret: bool,
}

/// Output of [`flatten`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedConfig {
    /// Assignments sorted by path.
    pub assignments: Vec<ConfigAssignment>,
    /// Secret values keyed by binding name.
    pub secret_env: BTreeMap<String, SecretValue>,
}

impl FlattenedConfig {
    /// Returns true if there is nothing to assign.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Flattens a configuration object.
///
/// Top-level keys are used verbatim as config keys; nested members use
/// `.key` or `["key"]` and array elements `[i]`. `Null`, `Unknown` and asset
/// values produce nothing. After sorting, the secret assignment at position
/// `i` is bound to `PLACEHOLDER_<i>`.
#[must_use]
pub fn flatten(config: &PropertyMap) -> FlattenedConfig {
    let mut leaves = BTreeMap::new();
    for (key, value) in config {
        walk(&mut leaves, key, value, false);
    }

    let mut flattened = FlattenedConfig::default();
    for (i, (path, (value, is_secret))) in leaves.into_iter().enumerate() {
        let value = if is_secret {
            let binding = format!("{PLACEHOLDER_PREFIX}{i}");
            flattened
                .secret_env
                .insert(binding.clone(), SecretValue::secret(value));
            binding
        } else {
            value
        };
        flattened.assignments.push(ConfigAssignment {
            path,
            value,
            is_secret,
        });
    }

    debug!(
        "Flattened config into {} assignments ({} secret)",
        flattened.assignments.len(),
        flattened.secret_env.len()
    );
    flattened
}

/// Shortest round-trip text for a config number.
///
/// Plain notation for decimal exponents in `-4..6`, otherwise scientific with
/// a signed exponent of at least two digits (`1e+06`, `1.5e-07`).
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return String::from("NaN");
    }
    if n.is_infinite() {
        return String::from(if n > 0.0 { "+Inf" } else { "-Inf" });
    }

    let scientific = format!("{n:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return n.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return n.to_string();
    };
    if (-4..6).contains(&exponent) {
        n.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

fn walk(out: &mut BTreeMap<String, (String, bool)>, path: &str, value: &PropertyValue, secret: bool) {
    match value {
        PropertyValue::Bool(b) => {
            out.insert(path.to_string(), (b.to_string(), secret));
        }
        PropertyValue::Number(n) => {
            out.insert(path.to_string(), (format_number(*n), secret));
        }
        PropertyValue::String(s) => {
            out.insert(path.to_string(), (s.clone(), secret));
        }
        PropertyValue::Secret(inner) => walk(out, path, inner, true),
        PropertyValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(out, &push_index(path, i), item, secret);
            }
        }
        PropertyValue::Object(members) => {
            for (key, member) in members {
                walk(out, &push_key(path, key), member, secret);
            }
        }
        PropertyValue::Null | PropertyValue::Unknown | PropertyValue::Asset(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_lifted_into_binding() {
        let config = PropertyMap::new().with("dbPassword", PropertyValue::secret("hunter2"));
        let flattened = flatten(&config);

        assert_eq!(
            flattened.assignments,
            vec![ConfigAssignment {
                path: String::from("dbPassword"),
                value: String::from("PLACEHOLDER_0"),
                is_secret: true,
            }]
        );
        assert_eq!(
            flattened.secret_env.get("PLACEHOLDER_0"),
            Some(&SecretValue::secret("hunter2"))
        );
    }

    #[test]
    fn test_paths_and_sorting() {
        let config = PropertyMap::new()
            .with("aws:region", "us-west-2")
            .with(
                "app",
                PropertyMap::new()
                    .with("replicas", 3.0)
                    .with("hosts", vec![PropertyValue::from("a"), PropertyValue::from("b")])
                    .with("my-key", true)
                    .with("ratio", 0.5),
            );
        let paths: Vec<(String, String)> = flatten(&config)
            .assignments
            .into_iter()
            .map(|a| (a.path, a.value))
            .collect();

        let expected = vec![
            ("app.hosts[0]", "a"),
            ("app.hosts[1]", "b"),
            ("app.ratio", "0.5"),
            ("app.replicas", "3"),
            ("app[\"my-key\"]", "true"),
            ("aws:region", "us-west-2"),
        ];
        assert_eq!(
            paths,
            expected
                .into_iter()
                .map(|(p, v)| (p.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_binding_index_follows_sorted_position() {
        let config = PropertyMap::new()
            .with("z", PropertyValue::secret("last"))
            .with("a", "first")
            .with(
                "m",
                PropertyValue::secret(PropertyMap::new().with("x", "mx").with("y", "my")),
            );
        let flattened = flatten(&config);

        let secret: Vec<(&str, &str)> = flattened
            .assignments
            .iter()
            .filter(|a| a.is_secret)
            .map(|a| (a.path.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            secret,
            vec![("m.x", "PLACEHOLDER_1"), ("m.y", "PLACEHOLDER_2"), ("z", "PLACEHOLDER_3")]
        );
        assert_eq!(flattened.secret_env["PLACEHOLDER_1"].value, "mx");
        assert_eq!(flattened.secret_env["PLACEHOLDER_3"].value, "last");
        assert!(!flattened.secret_env.contains_key("PLACEHOLDER_0"));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let forward: PropertyMap = [("b", PropertyValue::from(1.0)), ("a", PropertyValue::secret("s"))]
            .into_iter()
            .collect();
        let backward: PropertyMap = [("a", PropertyValue::secret("s")), ("b", PropertyValue::from(1.0))]
            .into_iter()
            .collect();
        assert_eq!(flatten(&forward), flatten(&backward));
        assert_eq!(flatten(&forward), flatten(&forward));
    }

    #[test]
    fn test_non_primitive_leaves_are_skipped() {
        let config = PropertyMap::new()
            .with("nothing", PropertyValue::Null)
            .with("later", PropertyValue::Unknown)
            .with("file", PropertyValue::Asset(String::from("data")));
        assert!(flatten(&config).is_empty());
    }

    #[test]
    fn test_number_text() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(123_456.0), "123456");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(1_000_000.0), "1e+06");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-1.5e-7), "-1.5e-07");
    }

    #[test]
    fn test_large_number_is_scientific() {
        let flattened = flatten(&PropertyMap::new().with("limit", 1e21));
        assert_eq!(flattened.assignments[0].value, "1e+21");
    }
}
