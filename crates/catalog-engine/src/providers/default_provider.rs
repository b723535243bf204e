//! The built-in "default" provider, used when `seed()` is called with an
//! absent or empty `service_id`.
//!
//! Supplies the farmers-module catalog: resources `{farmer, farm, cycle,
//! activity, fpo, kisansathi, stage, variety}`, actions `{create, read,
//! update, delete, list, manage, start, end, assign}`, and six roles
//! (`farmer`, `kisansathi`, `CEO`, `fpo_manager`, `admin`, `readonly`).

use async_trait::async_trait;

use crate::entities::{Action, Resource, RoleScope};
use crate::registry::{Provider, RoleDefinition};

const SERVICE_ID: &str = "farmers-module";
const SERVICE_NAME: &str = "Farmers Module";

const RESOURCE_NAMES: &[&str] = &[
    "farmer",
    "farm",
    "cycle",
    "activity",
    "fpo",
    "kisansathi",
    "stage",
    "variety",
];

const ACTION_NAMES: &[&str] = &[
    "create", "read", "update", "delete", "list", "manage", "start", "end", "assign",
];

/// The default farmers-module seed provider.
pub struct DefaultProvider;

#[async_trait]
impl Provider for DefaultProvider {
    fn service_id(&self) -> &str {
        SERVICE_ID
    }

    fn service_name(&self) -> &str {
        SERVICE_NAME
    }

    fn resources(&self) -> Vec<Resource> {
        RESOURCE_NAMES
            .iter()
            .map(|name| {
                Resource::new(
                    *name,
                    SERVICE_ID,
                    format!("a {name} managed by the farmers module"),
                    Some(SERVICE_NAME.to_string()),
                )
            })
            .collect()
    }

    fn actions(&self) -> Vec<Action> {
        ACTION_NAMES
            .iter()
            .map(|name| {
                Action::new(
                    *name,
                    format!("{name} a resource"),
                    "general",
                    false,
                    Some(SERVICE_ID.to_string()),
                )
            })
            .collect()
    }

    fn roles(&self) -> Vec<RoleDefinition> {
        vec![
            RoleDefinition {
                name: "farmer".to_string(),
                description: "a registered farmer managing their own farms and cycles"
                    .to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: None,
                permission_patterns: vec![
                    "farm:read".to_string(),
                    "farm:update".to_string(),
                    "cycle:create".to_string(),
                    "cycle:read".to_string(),
                    "cycle:update".to_string(),
                    "activity:create".to_string(),
                    "activity:read".to_string(),
                    "activity:update".to_string(),
                ],
            },
            RoleDefinition {
                name: "kisansathi".to_string(),
                description: "field agent assisting farmers with cycles and activities"
                    .to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: Some("farmer".to_string()),
                permission_patterns: vec![
                    "farmer:read".to_string(),
                    "farmer:list".to_string(),
                    "cycle:manage".to_string(),
                    "activity:manage".to_string(),
                    "stage:start".to_string(),
                    "stage:end".to_string(),
                ],
            },
            RoleDefinition {
                name: "fpo_manager".to_string(),
                description: "manager of a farmer producer organization".to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: None,
                permission_patterns: vec![
                    "fpo:manage".to_string(),
                    "farmer:list".to_string(),
                    "farmer:assign".to_string(),
                    "kisansathi:list".to_string(),
                    "kisansathi:assign".to_string(),
                    "variety:read".to_string(),
                    "variety:list".to_string(),
                ],
            },
            RoleDefinition {
                name: "CEO".to_string(),
                description: "executive oversight across all farmer producer organizations"
                    .to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: None,
                permission_patterns: vec!["*:read".to_string(), "*:list".to_string(), "fpo:manage".to_string()],
            },
            RoleDefinition {
                name: "admin".to_string(),
                description: "full administrative access".to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: None,
                permission_patterns: vec!["*:*".to_string()],
            },
            RoleDefinition {
                name: "readonly".to_string(),
                description: "read-only access across all resources".to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: None,
                permission_patterns: vec!["*:read".to_string(), "*:list".to_string()],
            },
        ]
    }
}
