//! `pulumiservice:index:AccessToken`.
//!
//! The service has no lookup endpoint for tokens, so reads echo the
//! recorded state. The token value is only ever returned on creation.

use async_trait::async_trait;
use tracing::info;

use crate::api::ServiceApi;
use crate::codec::PropertyRecord;
use crate::diff::{DiffEngine, DiffResponse};
use crate::error::{ProviderError, Result};
use crate::property_record;

use super::resource::{LEGACY_INPUTS_KEY, Resource, lift_legacy_inputs};
use super::types::{
    CreateRequest, CreateResponse, DeleteRequest, DiffRequest, ReadRequest, ReadResponse,
    UpdateRequest, UpdateResponse,
};

const TYPE_TOKEN: &str = "pulumiservice:index:AccessToken";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AccessTokenState {
    description: String,
    value: Option<String>,
}

property_record!(AccessTokenState {
    description => "description",
    #[secret] value => "value",
});

/// A personal access token. Changing the description replaces it.
#[derive(Debug, Default)]
pub struct AccessTokenResource;

#[async_trait]
impl Resource for AccessTokenResource {
    fn type_token(&self) -> &'static str {
        TYPE_TOKEN
    }

    async fn diff(&self, request: DiffRequest) -> Result<DiffResponse> {
        let olds = lift_legacy_inputs(&request.olds);
        let diff = DiffEngine::new()
            .replace_on(["description"])
            .ignoring(["value", LEGACY_INPUTS_KEY])
            .diff(&olds, &request.news);
        Ok(diff.to_response(false))
    }

    async fn create(&self, api: &dyn ServiceApi, request: CreateRequest) -> Result<CreateResponse> {
        let mut state = AccessTokenState::decode(&request.properties)?;

        let token = api
            .create_access_token(&state.description)
            .await
            .map_err(|e| {
                ProviderError::from(e).context(format!("create access token '{}'", state.description))
            })?;
        info!("Created access token {}", token.id);

        state.value = Some(token.token_value);
        Ok(CreateResponse {
            id: token.id,
            properties: state.to_property_map(),
        })
    }

    async fn read(&self, _api: &dyn ServiceApi, request: ReadRequest) -> Result<ReadResponse> {
        Ok(ReadResponse {
            id: request.id,
            properties: lift_legacy_inputs(&request.properties),
            inputs: request.inputs,
        })
    }

    async fn update(&self, _api: &dyn ServiceApi, request: UpdateRequest) -> Result<UpdateResponse> {
        // Only non-replacing changes reach here; nothing to send.
        let mut state = AccessTokenState::decode(&lift_legacy_inputs(&request.olds))?;
        if let Some(description) = request.news.get_str("description") {
            state.description = description.to_string();
        }
        Ok(UpdateResponse {
            properties: state.to_property_map(),
        })
    }

    async fn delete(&self, api: &dyn ServiceApi, request: DeleteRequest) -> Result<()> {
        api.delete_access_token(&request.id)
            .await
            .map_err(|e| ProviderError::from(e).context("delete access token"))?;
        info!("Deleted access token {}", request.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AccessToken, MockServiceApi};
    use crate::diff::{DiffChanges, DiffKind};
    use crate::error::ApiError;
    use crate::property::{PropertyMap, PropertyValue};

    #[tokio::test]
    async fn test_create_records_secret_value() {
        let mut api = MockServiceApi::new();
        api.expect_create_access_token()
            .withf(|description| description == "ci")
            .returning(|description| {
                Ok(AccessToken {
                    id: String::from("tok-1"),
                    token_value: String::from("pul-abc"),
                    description: description.to_string(),
                })
            });

        let response = AccessTokenResource
            .create(&api, CreateRequest {
                properties: PropertyMap::new().with("description", "ci"),
                ..CreateRequest::default()
            })
            .await
            .expect("create");

        assert_eq!(response.id, "tok-1");
        assert_eq!(response.properties["value"], PropertyValue::secret("pul-abc"));
        assert_eq!(response.properties.get_str("description"), Some("ci"));
    }

    #[tokio::test]
    async fn test_create_error_names_the_operation() {
        let mut api = MockServiceApi::new();
        api.expect_create_access_token()
            .returning(|_| Err(ApiError::status(409, "token limit reached")));

        let err = AccessTokenResource
            .create(&api, CreateRequest {
                properties: PropertyMap::new().with("description", "ci"),
                ..CreateRequest::default()
            })
            .await
            .expect_err("create");
        assert_eq!(
            err.to_string(),
            "failed to create access token 'ci': 409 API error: token limit reached"
        );
    }

    #[tokio::test]
    async fn test_description_change_replaces_through_legacy_inputs() {
        let olds = PropertyMap::new()
            .with(LEGACY_INPUTS_KEY, PropertyMap::new().with("description", "ci"))
            .with("value", PropertyValue::secret("pul-abc"));

        let unchanged = AccessTokenResource
            .diff(DiffRequest {
                olds: olds.clone(),
                news: PropertyMap::new().with("description", "ci"),
                ..DiffRequest::default()
            })
            .await
            .expect("diff");
        assert_eq!(unchanged.changes, DiffChanges::None);

        let changed = AccessTokenResource
            .diff(DiffRequest {
                olds,
                news: PropertyMap::new().with("description", "deploy"),
                ..DiffRequest::default()
            })
            .await
            .expect("diff");
        assert_eq!(changed.replaces, vec![String::from("description")]);
        assert_eq!(changed.detailed_diff["description"].kind, DiffKind::UpdateReplace);
    }

    #[tokio::test]
    async fn test_read_echoes_state() {
        let api = MockServiceApi::new();
        let properties = PropertyMap::new()
            .with("description", "ci")
            .with("value", PropertyValue::secret("pul-abc"));

        let response = AccessTokenResource
            .read(&api, ReadRequest {
                id: String::from("tok-1"),
                properties: properties.clone(),
                ..ReadRequest::default()
            })
            .await
            .expect("read");
        assert_eq!(response.id, "tok-1");
        assert_eq!(response.properties, properties);
    }

    #[tokio::test]
    async fn test_delete_uses_id() {
        let mut api = MockServiceApi::new();
        api.expect_delete_access_token()
            .withf(|id| id == "tok-1")
            .times(1)
            .returning(|_| Ok(()));

        AccessTokenResource
            .delete(&api, DeleteRequest {
                id: String::from("tok-1"),
                ..DeleteRequest::default()
            })
            .await
            .expect("delete");
    }
}
