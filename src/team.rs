use futures::future::Future;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::HashMap;
use std::fmt;

use crate::client::{ApiFuture, Client, Context, Envelope, SlackResponse};
use crate::null_as_default;
use crate::user::UserId;

pub const DEFAULT_LOGINS_COUNT: u32 = 100;
pub const DEFAULT_LOGINS_PAGE: u32 = 1;

const TEAM_INFO: &str = "team.info";
const TEAM_PROFILE_GET: &str = "team.profile.get";
const TEAM_ACCESS_LOGS: &str = "team.accessLogs";
const TEAM_BILLABLE_INFO: &str = "team.billableInfo";
const TEAM_EXTERNAL_TEAMS_LIST: &str = "team.externalTeams.list";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TeamId(String);

impl TeamId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        TeamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        TeamId(id.to_string())
    }
}

impl From<String> for TeamId {
    fn from(id: String) -> Self {
        TeamId(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TeamInfo {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub id: TeamId,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub domain: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub email_domain: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub icon: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TeamProfile {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub fields: Vec<TeamProfileField>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TeamProfileField {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub ordering: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub hint: String,
    #[serde(rename = "type", deserialize_with = "null_as_default::deserialize")]
    pub type_: String,
    pub possible_values: Option<Vec<String>>,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub is_hidden: bool,
    pub options: Option<HashMap<String, bool>>,
}

/// One row of the access log: a user seen from one IP and user agent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Login {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub user_id: UserId,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub username: String,
    /// Unix seconds
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub date_first: i64,
    /// Unix seconds
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub date_last: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub count: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub ip: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub user_agent: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub isp: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub region: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Paging {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub count: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub total: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub page: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub pages: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BillingActive {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub billing_active: bool,
}

/// A team connected to this one through shared channels.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Organization {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub team_id: TeamId,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub team_name: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub team_domain: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub public_url: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub connection_status: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub is_sponsored: bool,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub last_active_timestamp: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub connected_workspaces: Vec<ConnectedWorkspace>,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub slack_connect_prefs: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConnectedWorkspace {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub workspace_id: TeamId,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub workspace_name: String,
}

/// Page of the access log to fetch. `None` leaves the choice to the API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessLogParameters {
    pub team_id: Option<TeamId>,
    pub count: Option<u32>,
    pub page: Option<u32>,
}

impl AccessLogParameters {
    pub fn new() -> Self {
        AccessLogParameters::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillableInfoParameters {
    pub user: Option<UserId>,
    pub team_id: Option<TeamId>,
}

/// Filters for `team.externalTeams.list`.
///
/// The list filters are sent as a single value: only the first element of
/// `slack_connect_pref_filter` and `workspace_filter` reaches the API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalTeamsParameters {
    pub connection_status_filter: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
    pub slack_connect_pref_filter: Vec<String>,
    pub sort_direction: Option<String>,
    pub sort_field: Option<String>,
    pub workspace_filter: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TeamResponse {
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    team: TeamInfo,
    #[serde(flatten)]
    response: SlackResponse,
}

#[derive(Deserialize, Debug)]
struct TeamProfileResponse {
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    profile: TeamProfile,
    #[serde(flatten)]
    response: SlackResponse,
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    logins: Vec<Login>,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    paging: Paging,
    #[serde(flatten)]
    response: SlackResponse,
}

#[derive(Deserialize, Debug)]
struct BillableInfoResponse {
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    billable_info: HashMap<UserId, BillingActive>,
    #[serde(flatten)]
    response: SlackResponse,
}

#[derive(Deserialize, Debug)]
struct ExternalTeamsResponse {
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    organizations: Vec<Organization>,
    #[serde(flatten)]
    response: SlackResponse,
}

macro_rules! envelope {
    ($($response:ty),*) => {
        $(
            impl Envelope for $response {
                fn envelope(&self) -> &SlackResponse {
                    &self.response
                }
            }
        )*
    };
}

envelope!(
    TeamResponse,
    TeamProfileResponse,
    LoginResponse,
    BillableInfoResponse,
    ExternalTeamsResponse
);

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_ref().map(String::as_str).filter(|value| !value.is_empty())
}

impl Client {
    /// Team the token belongs to.
    pub fn get_team_info(&self, ctx: &Context) -> ApiFuture<TeamInfo> {
        let form = self.form();
        Box::new(
            self.post_method::<TeamResponse>(ctx, TEAM_INFO, form)
                .map(|response| response.team),
        )
    }

    /// Any team visible to the token. An empty `team` is the token's own team.
    pub fn get_other_team_info(&self, ctx: &Context, team: &str) -> ApiFuture<TeamInfo> {
        if team.is_empty() {
            return self.get_team_info(ctx);
        }

        let mut form = self.form();
        form.add("team", team);
        Box::new(
            self.post_method::<TeamResponse>(ctx, TEAM_INFO, form)
                .map(|response| response.team),
        )
    }

    /// Profile fields of the token's team, or of `team_id` when given.
    ///
    /// Only a single team id is sent; asking for several teams at once is not supported.
    pub fn get_team_profile(&self, ctx: &Context, team_id: Option<&TeamId>) -> ApiFuture<TeamProfile> {
        let mut form = self.form();
        if let Some(team_id) = team_id.filter(|id| !id.is_empty()) {
            form.add("team_id", team_id.as_str());
        }

        Box::new(
            self.post_method::<TeamProfileResponse>(ctx, TEAM_PROFILE_GET, form)
                .map(|response| response.profile),
        )
    }

    /// One page of logins. Counts and pages equal to the API defaults are not sent.
    pub fn get_access_logs(
        &self,
        ctx: &Context,
        params: &AccessLogParameters,
    ) -> ApiFuture<(Vec<Login>, Paging)> {
        let mut form = self.form();
        if let Some(team_id) = params.team_id.as_ref().filter(|id| !id.is_empty()) {
            form.add("team_id", team_id.as_str());
        }
        if let Some(count) = params.count.filter(|count| *count != DEFAULT_LOGINS_COUNT) {
            form.add("count", count.to_string());
        }
        if let Some(page) = params.page.filter(|page| *page != DEFAULT_LOGINS_PAGE) {
            form.add("page", page.to_string());
        }

        Box::new(
            self.post_method::<LoginResponse>(ctx, TEAM_ACCESS_LOGS, form)
                .map(|response| (response.logins, response.paging)),
        )
    }

    pub fn get_billable_info(
        &self,
        ctx: &Context,
        params: &BillableInfoParameters,
    ) -> ApiFuture<HashMap<UserId, BillingActive>> {
        let mut form = self.form();
        if let Some(team_id) = params.team_id.as_ref().filter(|id| !id.is_empty()) {
            form.add("team_id", team_id.as_str());
        }
        if let Some(user) = params.user.as_ref().filter(|user| !user.is_empty()) {
            form.add("user", user.as_str());
        }

        Box::new(
            self.post_method::<BillableInfoResponse>(ctx, TEAM_BILLABLE_INFO, form)
                .map(|response| response.billable_info),
        )
    }

    /// Connected teams plus the cursor of the next page (empty on the last page).
    pub fn get_external_teams(
        &self,
        ctx: &Context,
        params: Option<&ExternalTeamsParameters>,
    ) -> ApiFuture<(Vec<Organization>, String)> {
        let mut form = self.form();
        if let Some(params) = params {
            if let Some(filter) = non_empty(&params.connection_status_filter) {
                form.add("connection_status_filter", filter);
            }
            if let Some(cursor) = non_empty(&params.cursor) {
                form.add("cursor", cursor);
            }
            if let Some(limit) = params.limit.filter(|limit| *limit != 0) {
                form.add("limit", limit.to_string());
            }
            // TODO: send the whole list once multi-value filters are confirmed to work
            if let Some(filter) = params.slack_connect_pref_filter.first() {
                form.add("slack_connect_pref_filter", filter.as_str());
            }
            if let Some(direction) = non_empty(&params.sort_direction) {
                form.add("sort_direction", direction);
            }
            if let Some(field) = non_empty(&params.sort_field) {
                form.add("sort_field", field);
            }
            if let Some(filter) = params.workspace_filter.first() {
                form.add("workspace_filter", filter.as_str());
            }
        }

        Box::new(
            self.post_method::<ExternalTeamsResponse>(ctx, TEAM_EXTERNAL_TEAMS_LIST, form)
                .map(|response| {
                    (
                        response.organizations,
                        response.response.response_metadata.next_cursor,
                    )
                }),
        )
    }
}
