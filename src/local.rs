//! Filesystem and configuration backed services.
//!
//! Used by the offline `upcat` binary: team files are read from a local
//! source root and team membership comes from the config file.

use std::path::{Path, PathBuf};

use crate::config::MembersConfig;
use crate::model::{TeamId, UserId};
use crate::services::{FileService, MembershipService, ServiceError, TeamMember};

/// Team files stored below a local directory.
///
/// Remote path `/upc_references/a.json` maps to `<root>/upc_references/a.json`
/// for every team.
#[derive(Debug, Clone)]
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    /// Serve files from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path of a remote path.
    pub fn resolve(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }
}

impl FileService for LocalFiles {
    fn exists(&self, _team_id: TeamId, remote_path: &str) -> Result<bool, ServiceError> {
        Ok(self.resolve(remote_path).is_file())
    }

    fn download(
        &self,
        _team_id: TeamId,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), ServiceError> {
        let source = self.resolve(remote_path);
        std::fs::copy(&source, local_path).map_err(|e| {
            ServiceError::new("file", format!("copy {:?} -> {:?}: {}", source, local_path, e))
        })?;
        Ok(())
    }
}

/// Membership from a static login table.
#[derive(Debug, Clone, Default)]
pub struct StaticMembership {
    members: MembersConfig,
}

impl StaticMembership {
    /// Serve the configured members.
    pub fn new(members: MembersConfig) -> Self {
        Self { members }
    }
}

impl MembershipService for StaticMembership {
    fn resolve_user(&self, _team_id: TeamId, login: &str) -> Result<Option<UserId>, ServiceError> {
        Ok(self.members.logins.get(login).copied())
    }

    fn list_team_members(&self, _team_id: TeamId) -> Result<Vec<TeamMember>, ServiceError> {
        Ok(self
            .members
            .logins
            .iter()
            .map(|(login, &id)| TeamMember {
                id,
                login: login.clone(),
            })
            .collect())
    }

    fn team_name(&self, team_id: TeamId) -> Result<String, ServiceError> {
        if self.members.team_name.is_empty() {
            Ok(format!("team {team_id}"))
        } else {
            Ok(self.members.team_name.clone())
        }
    }
}
