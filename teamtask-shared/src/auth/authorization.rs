/// Team-scoped permission checks
///
/// Every rule is a pure function over the caller and already-loaded
/// documents, evaluated fresh on each request. Nothing here touches the
/// store; handlers load the team or task first, then ask.
///
/// # Permission Model
///
/// 1. **Captain**: the team's creator. Renames and deletes the team, manages
///    membership, creates tasks.
/// 2. **Member**: anyone in the team's member list (captain included). Reads
///    the team and its tasks.
/// 3. **Task creator**: sole authority to update or delete a task.
///
/// The global `role` flag on a user is not consulted; a captain of one team
/// is an ordinary member of another.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use teamtask_shared::auth::authorization::{require_captain, AuthzError};
/// use teamtask_shared::models::object_id::ObjectId;
/// use teamtask_shared::models::team::Team;
///
/// let captain = ObjectId::new();
/// let member = ObjectId::new();
/// let team = Team {
///     id: ObjectId::new(),
///     name: "Eng".to_string(),
///     captain: captain.clone(),
///     members: vec![captain.clone(), member.clone()],
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// assert!(require_captain(&team, &captain).is_ok());
/// assert!(matches!(require_captain(&team, &member), Err(AuthzError::NotCaptain)));
/// ```

use crate::models::object_id::ObjectId;
use crate::models::task::Task;
use crate::models::team::Team;

/// Authorization failures
///
/// `NotCaptain`, `NotTeamMember` and `NotTaskCreator` are permission
/// denials; the rest describe a request that cannot apply to the team's
/// current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Only the team captain can perform this action")]
    NotCaptain,

    #[error("You are not a member of this team")]
    NotTeamMember,

    #[error("Only the task creator can modify this task")]
    NotTaskCreator,

    #[error("Cannot remove the team captain")]
    CaptainRemoval,

    #[error("User is not a member of this team")]
    TargetNotMember,

    #[error("User is already a member of this team")]
    AlreadyMember,

    #[error("Assigned user is not a member of this team")]
    AssigneeNotMember,
}

/// Team rename, delete and membership management
pub fn require_captain(team: &Team, caller: &ObjectId) -> Result<(), AuthzError> {
    if team.is_captain(caller) {
        Ok(())
    } else {
        Err(AuthzError::NotCaptain)
    }
}

/// Team read, task read and task listing
pub fn require_team_member(team: &Team, caller: &ObjectId) -> Result<(), AuthzError> {
    if team.is_member(caller) {
        Ok(())
    } else {
        Err(AuthzError::NotTeamMember)
    }
}

/// Adding `target` to the team
///
/// The caller check runs first so outsiders learn nothing about the roster.
pub fn check_member_addition(
    team: &Team,
    caller: &ObjectId,
    target: &ObjectId,
) -> Result<(), AuthzError> {
    require_captain(team, caller)?;

    if team.is_member(target) {
        return Err(AuthzError::AlreadyMember);
    }

    Ok(())
}

/// Removing `target` from the team
///
/// Removing the captain is refused before the caller is even considered, so
/// the captain can never leave the member list by any path.
pub fn check_member_removal(
    team: &Team,
    caller: &ObjectId,
    target: &ObjectId,
) -> Result<(), AuthzError> {
    if team.is_captain(target) {
        return Err(AuthzError::CaptainRemoval);
    }

    require_captain(team, caller)?;

    if !team.is_member(target) {
        return Err(AuthzError::TargetNotMember);
    }

    Ok(())
}

/// Creating a task in the team assigned to `assignee`
pub fn check_task_creation(
    team: &Team,
    caller: &ObjectId,
    assignee: &ObjectId,
) -> Result<(), AuthzError> {
    require_captain(team, caller)?;

    if !team.is_member(assignee) {
        return Err(AuthzError::AssigneeNotMember);
    }

    Ok(())
}

/// Task update and delete
pub fn require_task_creator(task: &Task, caller: &ObjectId) -> Result<(), AuthzError> {
    if &task.created_by == caller {
        Ok(())
    } else {
        Err(AuthzError::NotTaskCreator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    struct Fixture {
        captain: ObjectId,
        member: ObjectId,
        outsider: ObjectId,
        team: Team,
    }

    fn fixture() -> Fixture {
        let captain = ObjectId::new();
        let member = ObjectId::new();
        let outsider = ObjectId::new();

        let team = Team {
            id: ObjectId::new(),
            name: "Eng".to_string(),
            captain: captain.clone(),
            members: vec![captain.clone(), member.clone()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        Fixture {
            captain,
            member,
            outsider,
            team,
        }
    }

    fn task_by(creator: &ObjectId, assignee: &ObjectId, team: &Team) -> Task {
        Task {
            id: ObjectId::new(),
            title: "t".to_string(),
            description: "d".to_string(),
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            assigned_to: assignee.clone(),
            created_by: creator.clone(),
            team: team.id.clone(),
            due_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_captain() {
        let f = fixture();
        assert!(require_captain(&f.team, &f.captain).is_ok());
        assert_eq!(require_captain(&f.team, &f.member), Err(AuthzError::NotCaptain));
        assert_eq!(require_captain(&f.team, &f.outsider), Err(AuthzError::NotCaptain));
    }

    #[test]
    fn test_require_team_member() {
        let f = fixture();
        assert!(require_team_member(&f.team, &f.captain).is_ok());
        assert!(require_team_member(&f.team, &f.member).is_ok());
        assert_eq!(
            require_team_member(&f.team, &f.outsider),
            Err(AuthzError::NotTeamMember)
        );
    }

    #[test]
    fn test_member_addition() {
        let f = fixture();
        assert!(check_member_addition(&f.team, &f.captain, &f.outsider).is_ok());
        assert_eq!(
            check_member_addition(&f.team, &f.captain, &f.member),
            Err(AuthzError::AlreadyMember)
        );
        assert_eq!(
            check_member_addition(&f.team, &f.member, &f.outsider),
            Err(AuthzError::NotCaptain)
        );
        // outsider probing for an existing member still gets a permission error
        assert_eq!(
            check_member_addition(&f.team, &f.outsider, &f.member),
            Err(AuthzError::NotCaptain)
        );
    }

    #[test]
    fn test_captain_removal_refused_for_everyone() {
        let f = fixture();
        for caller in [&f.captain, &f.member, &f.outsider] {
            assert_eq!(
                check_member_removal(&f.team, caller, &f.captain),
                Err(AuthzError::CaptainRemoval)
            );
        }
    }

    #[test]
    fn test_member_removal() {
        let f = fixture();
        assert!(check_member_removal(&f.team, &f.captain, &f.member).is_ok());
        assert_eq!(
            check_member_removal(&f.team, &f.member, &f.member),
            Err(AuthzError::NotCaptain)
        );
        assert_eq!(
            check_member_removal(&f.team, &f.captain, &f.outsider),
            Err(AuthzError::TargetNotMember)
        );
    }

    #[test]
    fn test_task_creation() {
        let f = fixture();
        assert!(check_task_creation(&f.team, &f.captain, &f.member).is_ok());
        assert!(check_task_creation(&f.team, &f.captain, &f.captain).is_ok());
        assert_eq!(
            check_task_creation(&f.team, &f.member, &f.member),
            Err(AuthzError::NotCaptain)
        );
        assert_eq!(
            check_task_creation(&f.team, &f.captain, &f.outsider),
            Err(AuthzError::AssigneeNotMember)
        );
    }

    #[test]
    fn test_only_creator_may_modify_task() {
        let f = fixture();
        let task = task_by(&f.captain, &f.member, &f.team);

        assert!(require_task_creator(&task, &f.captain).is_ok());
        // the assignee is not the creator
        assert_eq!(
            require_task_creator(&task, &f.member),
            Err(AuthzError::NotTaskCreator)
        );
    }
}
