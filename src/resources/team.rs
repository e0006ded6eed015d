//! `pulumiservice:index:Team`.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::{CreateTeamRequest, MemberAction, ServiceApi};
use crate::codec::PropertyRecord;
use crate::diff::{DiffEngine, DiffResponse};
use crate::error::{PropertyError, ProviderError, Result};
use crate::property::{PropertyMap, PropertyValue};
use crate::property_record;

use super::resource::{Resource, has_value, lift_legacy_inputs};
use super::types::{
    CheckFailure, CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest,
    DiffRequest, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};

const TYPE_TOKEN: &str = "pulumiservice:index:Team";

const MEMBERS_KEY: &str = "members";

/// Input keys compared by diff.
const INPUT_KEYS: [&str; 6] = [
    "teamType",
    "name",
    "displayName",
    "description",
    "organizationName",
    MEMBERS_KEY,
];

/// Team types that can be managed.
const TEAM_TYPES: [&str; 2] = ["pulumi", "github"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TeamInput {
    team_type: String,
    name: String,
    display_name: Option<String>,
    description: Option<String>,
    organization_name: String,
    members: Vec<String>,
}

property_record!(TeamInput {
    team_type => "teamType",
    name => "name",
    display_name => "displayName",
    description => "description",
    organization_name => "organizationName",
    members => "members",
});

impl TeamInput {
    /// Decodes inputs with members in sorted order.
    fn from_map(map: &PropertyMap) -> std::result::Result<Self, PropertyError> {
        let mut input = Self::decode(map)?;
        input.members.sort();
        Ok(input)
    }

    fn id(&self) -> String {
        format!("{}/{}", self.organization_name, self.name)
    }

    /// GitHub-backed teams get their membership from GitHub.
    fn manages_members(&self) -> bool {
        self.team_type != "github"
    }
}

fn split_team_id(id: &str) -> std::result::Result<(&str, &str), PropertyError> {
    match id.split_once('/') {
        Some((org, team)) if !org.is_empty() && !team.is_empty() && !team.contains('/') => Ok((org, team)),
        _ => Err(PropertyError::invalid_id("team", id)),
    }
}

/// An organization team and its members.
#[derive(Debug, Default)]
pub struct TeamResource;

impl TeamResource {
    async fn change_member(
        api: &dyn ServiceApi,
        team: &TeamInput,
        member: &str,
        action: MemberAction,
    ) -> Result<()> {
        let step = match action {
            MemberAction::Add => format!("add {member} to team {}", team.id()),
            MemberAction::Remove => format!("remove {member} from team {}", team.id()),
        };
        debug!("Team membership: {step}");
        api.update_team_membership(&team.organization_name, &team.name, member, action)
            .await
            .map_err(|e| ProviderError::from(e).context(step))
    }
}

#[async_trait]
impl Resource for TeamResource {
    fn type_token(&self) -> &'static str {
        TYPE_TOKEN
    }

    async fn check(&self, request: CheckRequest) -> Result<CheckResponse> {
        let news = &request.news;
        let mut failures = Vec::new();

        let team_type = news.get_str("teamType").unwrap_or_default();
        if !TEAM_TYPES.contains(&team_type) {
            failures.push(CheckFailure::new(
                "teamType",
                format!("found {team_type:?} instead of 'pulumi' or 'github'"),
            ));
        }
        if team_type == "pulumi" && !has_value(news, "name") {
            failures.push(CheckFailure::new("name", "teams with teamType 'pulumi' require a name"));
        }
        if !has_value(news, "organizationName") {
            failures.push(CheckFailure::new(
                "organizationName",
                "missing required property 'organizationName'",
            ));
        }

        Ok(CheckResponse::new(request.news, failures))
    }

    async fn diff(&self, request: DiffRequest) -> Result<DiffResponse> {
        // Raw maps, so values not yet known during a preview still diff.
        let olds = diff_inputs(&lift_legacy_inputs(&request.olds));
        let news = diff_inputs(&request.news);

        let diff = DiffEngine::new()
            .replace_on(["organizationName", "name", "teamType"])
            .ignoring(request.ignore_changes.iter().map(String::as_str))
            .diff(&olds, &news);
        Ok(diff.to_response(false))
    }

    async fn create(&self, api: &dyn ServiceApi, request: CreateRequest) -> Result<CreateResponse> {
        let input = TeamInput::from_map(&request.properties)?;

        let team = api
            .create_team(&CreateTeamRequest {
                organization: input.organization_name.clone(),
                team_type: input.team_type.clone(),
                name: input.name.clone(),
                display_name: input.display_name.clone().unwrap_or_default(),
                description: input.description.clone().unwrap_or_default(),
            })
            .await
            .map_err(|e| ProviderError::from(e).context(format!("create team '{}'", input.name)))?;
        let id = format!("{}/{}", input.organization_name, team.name);
        info!("Created team {id}");

        // The team exists from here on; failures must report it so it is not leaked.
        let mut created = TeamInput {
            members: Vec::new(),
            ..input.clone()
        };
        for member in &input.members {
            if let Err(e) = Self::change_member(api, &input, member, MemberAction::Add).await {
                warn!("Team {id} created without all members: {e}");
                return Err(ProviderError::InitFailed {
                    id,
                    properties: created.to_property_map(),
                    reasons: vec![e.to_string()],
                });
            }
            created.members.push(member.clone());
        }

        Ok(CreateResponse {
            id,
            properties: created.to_property_map(),
        })
    }

    async fn read(&self, api: &dyn ServiceApi, request: ReadRequest) -> Result<ReadResponse> {
        let (organization, name) = split_team_id(&request.id)?;

        let Some(team) = api
            .get_team(organization, name)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("read team ({})", request.id)))?
        else {
            return Ok(ReadResponse::gone());
        };

        let mut members: Vec<String> = team.members.into_iter().map(|m| m.github_login).collect();
        members.sort();
        let observed = TeamInput {
            team_type: team.team_type,
            name: team.name,
            display_name: Some(team.display_name).filter(|s| !s.is_empty()),
            description: Some(team.description).filter(|s| !s.is_empty()),
            organization_name: organization.to_string(),
            members,
        };

        let properties = observed.to_property_map();
        Ok(ReadResponse {
            id: request.id,
            inputs: properties.clone(),
            properties,
        })
    }

    async fn update(&self, api: &dyn ServiceApi, request: UpdateRequest) -> Result<UpdateResponse> {
        let old = TeamInput::from_map(&lift_legacy_inputs(&request.olds))?;
        let new = TeamInput::from_map(&request.news)?;

        if old.display_name != new.display_name || old.description != new.description {
            api.update_team(
                &new.organization_name,
                &new.name,
                new.display_name.as_deref().unwrap_or_default(),
                new.description.as_deref().unwrap_or_default(),
            )
            .await
            .map_err(|e| ProviderError::from(e).context(format!("update team {}", new.id())))?;
        }

        if old.members != new.members && new.manages_members() {
            for member in old.members.iter().filter(|m| !new.members.contains(m)) {
                Self::change_member(api, &new, member, MemberAction::Remove).await?;
            }
            for member in new.members.iter().filter(|m| !old.members.contains(m)) {
                Self::change_member(api, &new, member, MemberAction::Add).await?;
            }
        }

        Ok(UpdateResponse {
            properties: new.to_property_map(),
        })
    }

    async fn delete(&self, api: &dyn ServiceApi, request: DeleteRequest) -> Result<()> {
        let (organization, name) = split_team_id(&request.id)?;
        api.delete_team(organization, name)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("delete team {}", request.id)))?;
        info!("Deleted team {}", request.id);
        Ok(())
    }
}

/// Team inputs as compared by diff.
///
/// Members are sorted when all of them are known. A list with an unknown
/// member is unknown as a whole, since membership cannot be compared yet.
fn diff_inputs(map: &PropertyMap) -> PropertyMap {
    let mut inputs: PropertyMap = map
        .iter()
        .filter(|(key, _)| INPUT_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if let Some(members) = inputs.get(MEMBERS_KEY).and_then(PropertyValue::as_array) {
        let known: Option<Vec<&str>> = members.iter().map(PropertyValue::as_str).collect();
        let normalized = match known {
            Some(mut names) => {
                names.sort_unstable();
                PropertyValue::from(names.into_iter().map(PropertyValue::from).collect::<Vec<_>>())
            }
            None => PropertyValue::Unknown,
        };
        inputs.insert(MEMBERS_KEY.to_string(), normalized);
    }
    inputs
}
