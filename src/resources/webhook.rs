//! `pulumiservice:index:Webhook`.
//!
//! The service only returns the webhook secret as ciphertext. State records
//! that ciphertext next to the plaintext input so a refresh can tell whether
//! the secret was changed remotely.

use async_trait::async_trait;
use tracing::info;

use crate::api::{ServiceApi, WebhookId, WebhookRequest};
use crate::codec::PropertyRecord;
use crate::diff::{DiffEngine, DiffResponse};
use crate::error::{ProviderError, Result};
use crate::property::PropertyMap;
use crate::property_record;
use crate::secrets::{self, SecretRole, SecretSource};

use super::resource::{Resource, has_value, lift_legacy_inputs};
use super::types::{
    CheckFailure, CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest,
    DiffRequest, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};

const TYPE_TOKEN: &str = "pulumiservice:index:Webhook";

const SECRET_KEY: &str = "secret";
const SECRET_CIPHERTEXT_KEY: &str = "secretCiphertext";

const STACK_HOOK_PAIRING: &str =
    "both projectName and stackName must be specified for stack webhooks, or both unspecified for org webhooks";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct WebhookInput {
    active: bool,
    display_name: String,
    payload_url: String,
    secret: Option<String>,
    organization_name: String,
    project_name: Option<String>,
    stack_name: Option<String>,
    name: Option<String>,
}

property_record!(WebhookInput {
    active => "active",
    display_name => "displayName",
    payload_url => "payloadUrl",
    #[secret] secret => "secret",
    organization_name => "organizationName",
    project_name => "projectName",
    stack_name => "stackName",
    name => "name",
});

impl WebhookInput {
    fn request(&self, name: Option<String>) -> WebhookRequest {
        WebhookRequest {
            name,
            organization_name: self.organization_name.clone(),
            project_name: self.project_name.clone(),
            stack_name: self.stack_name.clone(),
            display_name: self.display_name.clone(),
            payload_url: self.payload_url.clone(),
            secret: self.secret.clone(),
            active: self.active,
        }
    }

    fn hook_id(&self, name: &str) -> WebhookId {
        WebhookId {
            organization: self.organization_name.clone(),
            stack: self.project_name.clone().zip(self.stack_name.clone()),
            name: name.to_string(),
        }
    }
}

/// Records the secret input and its ciphertext according to `source`.
fn record_secret(state: &mut PropertyMap, source: SecretSource<'_>, ciphertext: &str) {
    secrets::apply(state, SECRET_KEY, source, ciphertext, SecretRole::Input);
    secrets::apply(state, SECRET_CIPHERTEXT_KEY, source, ciphertext, SecretRole::Output);
}

/// An organization or stack webhook.
#[derive(Debug, Default)]
pub struct WebhookResource;

#[async_trait]
impl Resource for WebhookResource {
    fn type_token(&self) -> &'static str {
        TYPE_TOKEN
    }

    async fn check(&self, request: CheckRequest) -> Result<CheckResponse> {
        let news = &request.news;
        let mut failures: Vec<CheckFailure> = ["organizationName", "payloadUrl", "displayName", "active"]
            .into_iter()
            .filter(|key| !has_value(news, key))
            .map(|key| CheckFailure::new(key, format!("missing required property '{key}'")))
            .collect();

        match (has_value(news, "projectName"), has_value(news, "stackName")) {
            (false, true) => failures.push(CheckFailure::new("projectName", STACK_HOOK_PAIRING)),
            (true, false) => failures.push(CheckFailure::new("stackName", STACK_HOOK_PAIRING)),
            _ => {}
        }

        if news.get(SECRET_KEY).is_some_and(secrets::needs_replacement) {
            failures.push(CheckFailure::new(
                SECRET_KEY,
                "imported webhooks need the actual secret value in place of the placeholder",
            ));
        }

        Ok(CheckResponse::new(request.news, failures))
    }

    async fn diff(&self, request: DiffRequest) -> Result<DiffResponse> {
        let olds = lift_legacy_inputs(&request.olds);
        let diff = DiffEngine::new()
            .replace_on(["organizationName", "projectName", "stackName"])
            .ignoring(["name", SECRET_CIPHERTEXT_KEY])
            .ignoring(request.ignore_changes.iter().map(String::as_str))
            .diff(&olds, &request.news);
        Ok(diff.to_response(false))
    }

    async fn create(&self, api: &dyn ServiceApi, request: CreateRequest) -> Result<CreateResponse> {
        let input = WebhookInput::decode(&request.properties)?;

        let hook = api
            .create_webhook(&input.request(None))
            .await
            .map_err(|e| ProviderError::from(e).context(format!("create webhook '{}'", input.display_name)))?;
        let id = input.hook_id(&hook.name);
        info!("Created webhook {id}");

        let mut state = WebhookInput {
            name: Some(hook.name.clone()),
            ..input.clone()
        }
        .to_property_map();
        if let Some(plaintext) = input.secret.as_deref() {
            let ciphertext = hook.secret.unwrap_or_default();
            record_secret(&mut state, SecretSource::Create { plaintext }, &ciphertext);
        }

        Ok(CreateResponse {
            id: id.to_string(),
            properties: state,
        })
    }

    async fn read(&self, api: &dyn ServiceApi, request: ReadRequest) -> Result<ReadResponse> {
        let id: WebhookId = request.id.parse()?;
        let Some(hook) = api
            .get_webhook(&id)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("read webhook ({id})")))?
        else {
            return Ok(ReadResponse::gone());
        };

        let (project_name, stack_name) = id.stack.clone().unzip();
        let observed = WebhookInput {
            active: hook.active,
            display_name: hook.display_name,
            payload_url: hook.payload_url,
            secret: None,
            organization_name: id.organization.clone(),
            project_name,
            stack_name,
            name: Some(id.name.clone()),
        };

        let mut properties = observed.to_property_map();
        if let Some(ciphertext) = hook.secret.as_deref() {
            let prior = lift_legacy_inputs(&request.properties);
            let source = if prior.is_empty() {
                SecretSource::Import
            } else {
                SecretSource::Merge {
                    plaintext: prior.get_str(SECRET_KEY),
                    old_ciphertext: prior.get_str(SECRET_CIPHERTEXT_KEY),
                }
            };
            record_secret(&mut properties, source, ciphertext);
        }

        let mut inputs = properties.clone();
        inputs.remove("name");
        inputs.remove(SECRET_CIPHERTEXT_KEY);

        Ok(ReadResponse {
            id: request.id,
            properties,
            inputs,
        })
    }

    async fn update(&self, api: &dyn ServiceApi, request: UpdateRequest) -> Result<UpdateResponse> {
        let id: WebhookId = request.id.parse()?;
        let new = WebhookInput::decode(&request.news)?;

        api.update_webhook(&id, &new.request(Some(id.name.clone())))
            .await
            .map_err(|e| ProviderError::from(e).context(format!("update webhook ({id})")))?;

        let mut state = WebhookInput {
            name: Some(id.name.clone()),
            ..new.clone()
        }
        .to_property_map();
        if let Some(plaintext) = new.secret.as_deref() {
            // Updates return no body; fetch the new ciphertext for later refreshes.
            let ciphertext = api
                .get_webhook(&id)
                .await
                .map_err(|e| ProviderError::from(e).context(format!("read webhook ({id})")))?
                .and_then(|hook| hook.secret)
                .unwrap_or_default();
            record_secret(&mut state, SecretSource::Create { plaintext }, &ciphertext);
        }

        Ok(UpdateResponse { properties: state })
    }

    async fn delete(&self, api: &dyn ServiceApi, request: DeleteRequest) -> Result<()> {
        let id: WebhookId = request.id.parse()?;
        api.delete_webhook(&id)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("delete webhook ({id})")))?;
        info!("Deleted webhook {id}");
        Ok(())
    }
}
