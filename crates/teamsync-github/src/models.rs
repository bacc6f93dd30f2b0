//! Request and response bodies for the team endpoints.

use serde::{Deserialize, Serialize};

use teamsync_core::provider::GroupSummary;

/// A team as returned by `/orgs/{org}/teams` and friends. Other fields are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

impl From<Team> for GroupSummary {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            slug: team.slug,
        }
    }
}

/// A user entry in member listings and `/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTeam<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_team_id: Option<u64>,
    pub privacy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UpdateTeam<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct Membership {
    pub role: &'static str,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
}
