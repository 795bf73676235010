/// Partial task updates
///
/// A patch is built from a sparse set of field assignments. Only fields that
/// are present are considered; absent fields are left untouched. Validation
/// runs over every field in one pass and reports all problems together, so a
/// request that fails never mutates anything.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use teamtask_shared::models::task::TaskStatus;
/// use teamtask_shared::models::task_patch::TaskPatch;
///
/// let fields = json!({ "status": "completed" });
/// let patch = TaskPatch::from_fields(fields.as_object().unwrap()).unwrap();
/// assert_eq!(patch.status, Some(TaskStatus::Completed));
/// assert!(patch.title.is_none());
///
/// let bad = json!({ "status": "done", "owner": "me" });
/// let errors = TaskPatch::from_fields(bad.as_object().unwrap()).unwrap_err();
/// assert_eq!(errors.len(), 2);
/// ```

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::object_id::ObjectId;
use super::task::{Task, TaskPriority, TaskStatus};
use crate::validation::{object_id_field, parse_due_date, FieldError, DUE_DATE_FORMAT_MESSAGE};

/// Fields a caller may change after creation, in wire form
pub const UPDATABLE_FIELDS: [&str; 6] = [
    "title",
    "description",
    "priority",
    "status",
    "dueDate",
    "assignedTo",
];

/// Validated set of field assignments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<ObjectId>,
}

impl TaskPatch {
    /// Validates raw field assignments
    ///
    /// # Errors
    ///
    /// Returns every problem found: fields outside [`UPDATABLE_FIELDS`],
    /// non-string values, a blank title, malformed due date or identifier,
    /// unknown priority or status, or an empty request.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut patch = TaskPatch::default();
        let mut errors = Vec::new();

        if fields.is_empty() {
            return Err(vec![FieldError::new(
                "body",
                format!(
                    "No fields to update; allowed fields: {}",
                    UPDATABLE_FIELDS.join(", ")
                ),
            )]);
        }

        for (field, value) in fields {
            if !UPDATABLE_FIELDS.contains(&field.as_str()) {
                errors.push(FieldError::new(
                    field.as_str(),
                    format!("Field '{}' is not allowed to be updated", field),
                ));
                continue;
            }

            let Some(text) = value.as_str() else {
                errors.push(FieldError::new(
                    field.as_str(),
                    format!("{} must be a string", field),
                ));
                continue;
            };

            match field.as_str() {
                "title" => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        errors.push(FieldError::new("title", "Title cannot be empty"));
                    } else {
                        patch.title = Some(trimmed.to_string());
                    }
                }
                "description" => patch.description = Some(text.to_string()),
                "priority" => match text.parse::<TaskPriority>() {
                    Ok(priority) => patch.priority = Some(priority),
                    Err(message) => errors.push(FieldError::new("priority", message)),
                },
                "status" => match text.parse::<TaskStatus>() {
                    Ok(status) => patch.status = Some(status),
                    Err(message) => errors.push(FieldError::new("status", message)),
                },
                "dueDate" => match parse_due_date(text) {
                    Some(due_date) => patch.due_date = Some(due_date),
                    None => errors.push(FieldError::new("dueDate", DUE_DATE_FORMAT_MESSAGE)),
                },
                "assignedTo" => match object_id_field("assignedTo", text) {
                    Ok(id) => patch.assigned_to = Some(id),
                    Err(e) => errors.push(e),
                },
                _ => unreachable!("field list checked above"),
            }
        }

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(errors)
        }
    }

    /// Wire names of the fields this patch touches
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.due_date.is_some() {
            fields.push("dueDate");
        }
        if self.assigned_to.is_some() {
            fields.push("assignedTo");
        }
        fields
    }

    /// Writes the present fields onto a task and stamps `updated_at`
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        task.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn sample_task() -> Task {
        let created = Utc::now() - Duration::hours(1);
        Task {
            id: ObjectId::new(),
            title: "Write docs".to_string(),
            description: "All of them".to_string(),
            priority: TaskPriority::Low,
            status: TaskStatus::Pending,
            assigned_to: ObjectId::new(),
            created_by: ObjectId::new(),
            team: ObjectId::new(),
            due_date: created + Duration::days(3),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_status_only_patch_leaves_other_fields() {
        let patch = TaskPatch::from_fields(&fields(json!({ "status": "completed" }))).unwrap();
        assert_eq!(patch.touched_fields(), vec!["status"]);

        let mut task = sample_task();
        let before = task.clone();
        let now = Utc::now();
        patch.apply(&mut task, now);

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.title, before.title);
        assert_eq!(task.description, before.description);
        assert_eq!(task.priority, before.priority);
        assert_eq!(task.due_date, before.due_date);
        assert_eq!(task.assigned_to, before.assigned_to);
        assert_eq!(task.updated_at, now);
        assert!(task.updated_at > before.updated_at);
    }

    #[test]
    fn test_all_fields_parse() {
        let assignee = ObjectId::new();
        let patch = TaskPatch::from_fields(&fields(json!({
            "title": "  Release  ",
            "description": "",
            "priority": "critical",
            "status": "over_due",
            "dueDate": "2025-12-31",
            "assignedTo": assignee.as_str(),
        })))
        .unwrap();

        assert_eq!(patch.title.as_deref(), Some("Release"));
        assert_eq!(patch.description.as_deref(), Some(""));
        assert_eq!(patch.priority, Some(TaskPriority::Critical));
        assert_eq!(patch.status, Some(TaskStatus::OverDue));
        assert!(patch.due_date.is_some());
        assert_eq!(patch.assigned_to, Some(assignee));
        assert_eq!(patch.touched_fields().len(), 6);
    }

    #[test]
    fn test_unknown_fields_and_bad_values_are_aggregated() {
        let errors = TaskPatch::from_fields(&fields(json!({
            "title": "   ",
            "dueDate": "not-a-date",
            "createdBy": "64b7f0c2a1b2c3d4e5f60718",
            "team": "x",
            "priority": "urgent",
        })))
        .unwrap_err();

        let mut names: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["createdBy", "dueDate", "priority", "team", "title"]);

        let due = errors.iter().find(|e| e.field == "dueDate").unwrap();
        assert!(due.message.contains("due date format"));
    }

    #[test]
    fn test_unknown_field_fails_even_with_valid_fields() {
        let errors = TaskPatch::from_fields(&fields(json!({
            "status": "completed",
            "createdBy": "64b7f0c2a1b2c3d4e5f60718",
        })))
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "createdBy");
    }

    #[test]
    fn test_assigned_to_shape_is_checked() {
        let errors =
            TaskPatch::from_fields(&fields(json!({ "assignedTo": "bob" }))).unwrap_err();
        assert_eq!(errors[0].field, "assignedTo");
    }

    #[test]
    fn test_non_string_values_rejected() {
        let errors = TaskPatch::from_fields(&fields(json!({
            "title": 42,
            "status": null,
        })))
        .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_empty_patch_rejected() {
        let errors = TaskPatch::from_fields(&Map::new()).unwrap_err();
        assert_eq!(errors[0].field, "body");
    }
}
