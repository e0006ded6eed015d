//! Rendering of flattened config into `pulumi config set` commands.

use super::FlattenedConfig;

/// Renders one command per assignment, in assignment order.
///
/// Secret values are passed by referencing their environment binding, so the
/// plaintext never appears in the command.
#[must_use]
pub fn render_config_commands(config: &FlattenedConfig) -> Vec<String> {
    config
        .assignments
        .iter()
        .map(|a| {
            if a.is_secret {
                format!(
                    "pulumi config set --secret --path {} \"${}\"",
                    shell_quote(&a.path),
                    a.value
                )
            } else {
                format!(
                    "pulumi config set --path {} {}",
                    shell_quote(&a.path),
                    shell_quote(&a.value)
                )
            }
        })
        .collect()
}

/// Single-quotes `s` for a POSIX shell.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::property::{PropertyMap, PropertyValue};

    #[test]
    fn test_render_commands() {
        let config = PropertyMap::new()
            .with("aws:region", "us-west-2")
            .with("dbPassword", PropertyValue::secret("hunter2"))
            .with("tags", PropertyMap::new().with("team name", "it's us"));
        let commands = render_config_commands(&flatten(&config));

        assert_eq!(
            commands,
            vec![
                String::from("pulumi config set --path 'aws:region' 'us-west-2'"),
                String::from("pulumi config set --secret --path 'dbPassword' \"$PLACEHOLDER_1\""),
                String::from(r#"pulumi config set --path 'tags["team name"]' 'it'\''s us'"#),
            ]
        );
        assert!(commands.iter().all(|c| !c.contains("hunter2")));
    }
}
