use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{deserialize_some, field_error, Task, COLOR_REGEX};

/// A project as stored and returned by the API, with its derived task count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_count: i64,
}

/// The slice of a project embedded into task responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            color: project.color.clone(),
        }
    }
}

/// Single-project view: the project plus its most recent tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

/// Body of `POST /api/projects`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 100, message = "Project name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description too long"))]
    pub description: Option<String>,

    #[validate(regex(path = "COLOR_REGEX", message = "Invalid color format (use #RRGGBB)"))]
    pub color: Option<String>,
}

impl ProjectInput {
    /// Trims the name; validation runs on the trimmed value.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

/// Validated creation data handed to the store.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl From<ProjectInput> for NewProject {
    fn from(input: ProjectInput) -> Self {
        Self {
            name: input.name,
            description: input.description,
            color: input.color,
        }
    }
}

/// Body of `PATCH /api/projects/{id}`. Absent fields are left untouched,
/// `null` clears `description` or `color`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub color: Option<Option<String>>,
}

impl ProjectPatch {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.color.is_none()
    }

    /// Applies the patch to a stored project.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
    }
}

impl Validate for ProjectPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = &self.name {
            let len = name.chars().count();
            if len == 0 || len > 100 {
                errors.add(
                    "name",
                    field_error("length", "Project name must be 1-100 characters"),
                );
            }
        }
        if let Some(Some(description)) = &self.description {
            if description.chars().count() > 500 {
                errors.add("description", field_error("length", "Description too long"));
            }
        }
        if let Some(Some(color)) = &self.color {
            if !COLOR_REGEX.is_match(color) {
                errors.add(
                    "color",
                    field_error("regex", "Invalid color format (use #RRGGBB)"),
                );
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_input_validation() {
        let valid = ProjectInput {
            name: "  Website  ".into(),
            description: Some("Relaunch".into()),
            color: Some("#1A2b3C".into()),
        }
        .normalized();
        assert_eq!(valid.name, "Website");
        assert!(valid.validate().is_ok());

        let blank = ProjectInput {
            name: "   ".into(),
            description: None,
            color: None,
        }
        .normalized();
        assert!(blank.validate().is_err());

        let bad_color = ProjectInput {
            name: "P".into(),
            description: None,
            color: Some("1A2B3C".into()),
        };
        assert!(bad_color.validate().is_err());
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: ProjectPatch = serde_json::from_str(r#"{"color": null}"#).unwrap();
        assert_eq!(patch.color, Some(None));
        assert_eq!(patch.description, None);
        assert!(patch.name.is_none());
        assert!(!patch.is_empty());

        let empty: ProjectPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_patch_validation_and_apply() {
        let now = Utc::now();
        let mut project = Project {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Old".into(),
            description: Some("keep me".into()),
            color: Some("#000000".into()),
            created_at: now,
            updated_at: now,
            task_count: 0,
        };

        let invalid = ProjectPatch {
            color: Some(Some("red".into())),
            ..Default::default()
        };
        assert!(invalid.validate().is_err());

        let patch = ProjectPatch {
            name: Some("New".into()),
            description: None,
            color: Some(None),
        };
        assert!(patch.validate().is_ok());
        patch.apply_to(&mut project);

        assert_eq!(project.name, "New");
        assert_eq!(project.description.as_deref(), Some("keep me"));
        assert!(project.color.is_none());
    }
}
