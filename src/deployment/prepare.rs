//! Folding stack configuration into deployment settings.

use tracing::debug;

use crate::api::{ApiResult, DeploymentSettings, OperationContext, ServiceApi, StackName};
use crate::flatten::{flatten, render_config_commands};
use crate::property::PropertyMap;

/// Prepends `pulumi config set` commands for `config` to the pre-run commands
/// of `settings` and adds the secret bindings to its environment.
///
/// When `settings` carries no pre-run commands, the ones stored on the stack
/// are kept after the config commands instead, since per-run commands replace
/// the stored ones.
///
/// # Errors
///
/// Returns an error if the stored settings cannot be fetched.
pub async fn prepare_deployment(
    api: &dyn ServiceApi,
    stack: &StackName,
    mut settings: DeploymentSettings,
    config: &PropertyMap,
) -> ApiResult<DeploymentSettings> {
    if config.is_empty() {
        return Ok(settings);
    }

    let flattened = flatten(config);
    let mut commands = render_config_commands(&flattened);
    debug!("{} config commands for {stack}", commands.len());

    let mut pre_run = settings
        .operation_context
        .as_ref()
        .map(|ctx| ctx.pre_run_commands.clone())
        .unwrap_or_default();
    if pre_run.is_empty() {
        pre_run = api
            .get_deployment_settings(stack)
            .await?
            .and_then(|stored| stored.operation_context)
            .map(|ctx| ctx.pre_run_commands)
            .unwrap_or_default();
    }
    commands.extend(pre_run);

    let context = settings
        .operation_context
        .get_or_insert_with(OperationContext::default);
    context.pre_run_commands = commands;
    context.environment_variables.extend(flattened.secret_env);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockServiceApi;
    use crate::property::PropertyValue;
    use crate::secrets::SecretValue;

    fn stack() -> StackName {
        StackName::new("acme", "web", "prod")
    }

    #[tokio::test]
    async fn test_empty_config_leaves_settings_alone() {
        let api = MockServiceApi::new();
        let settings = prepare_deployment(&api, &stack(), DeploymentSettings::default(), &PropertyMap::new())
            .await
            .expect("prepare");
        assert_eq!(settings, DeploymentSettings::default());
    }

    #[tokio::test]
    async fn test_config_goes_before_stored_commands() {
        let mut api = MockServiceApi::new();
        api.expect_get_deployment_settings().times(1).returning(|_| {
            Ok(Some(DeploymentSettings {
                operation_context: Some(OperationContext {
                    pre_run_commands: vec![String::from("make deps")],
                    ..OperationContext::default()
                }),
                ..DeploymentSettings::default()
            }))
        });

        let config = PropertyMap::new().with("dbPassword", PropertyValue::secret("hunter2"));
        let settings = prepare_deployment(&api, &stack(), DeploymentSettings::default(), &config)
            .await
            .expect("prepare");

        let context = settings.operation_context.expect("context");
        assert_eq!(
            context.pre_run_commands,
            vec![
                String::from("pulumi config set --secret --path 'dbPassword' \"$PLACEHOLDER_0\""),
                String::from("make deps"),
            ]
        );
        assert_eq!(
            context.environment_variables.get("PLACEHOLDER_0"),
            Some(&SecretValue::secret("hunter2"))
        );
    }

    #[tokio::test]
    async fn test_own_commands_skip_stored_lookup() {
        let mut api = MockServiceApi::new();
        api.expect_get_deployment_settings().never();

        let settings = DeploymentSettings {
            operation_context: Some(OperationContext {
                pre_run_commands: vec![String::from("npm ci")],
                ..OperationContext::default()
            }),
            ..DeploymentSettings::default()
        };
        let config = PropertyMap::new().with("aws:region", "us-west-2");
        let settings = prepare_deployment(&api, &stack(), settings, &config)
            .await
            .expect("prepare");

        let context = settings.operation_context.expect("context");
        assert_eq!(context.pre_run_commands.len(), 2);
        assert_eq!(context.pre_run_commands[1], "npm ci");
        assert!(context.environment_variables.is_empty());
    }

    #[tokio::test]
    async fn test_missing_stored_settings_is_not_an_error() {
        let mut api = MockServiceApi::new();
        api.expect_get_deployment_settings().returning(|_| Ok(None));

        let config = PropertyMap::new().with("count", 3.0);
        let settings = prepare_deployment(&api, &stack(), DeploymentSettings::default(), &config)
            .await
            .expect("prepare");
        assert_eq!(
            settings.operation_context.expect("context").pre_run_commands,
            vec![String::from("pulumi config set --path 'count' '3'")]
        );
    }
}
