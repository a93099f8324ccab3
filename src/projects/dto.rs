use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
}

/// Raw list parameters; parsed by hand so every bad value can be reported
/// against its own field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsQuery {
    pub limit: Option<String>,
    pub cursor_created_at: Option<String>,
    pub cursor_id: Option<String>,
}
