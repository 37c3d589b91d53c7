/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fs::create_dir_all;
use std::path::Path;

use tracing::{debug, info, warn};

use super::command::{redact_url, GitCommand};
use super::config::GitConfig;
use crate::entity::{Entity, EntityKind, IdKind, RecordId};
use crate::store::Repository;

/// The first line of every commit message.
const COMMIT_HEADER: &str = "Committed changes:";

/// Describe a two-letter status code from `git status --porcelain`.
fn describe_status(code: &str) -> &'static str {
    let code = code.trim();
    if code == "??" {
        return "untracked";
    }
    match code.chars().next() {
        Some('A') => "added",
        Some('M') => "modified",
        Some('D') => "deleted",
        Some('R') => "renamed",
        Some('C') => "copied",
        Some('T') => "type changed",
        _ => "changed",
    }
}

/// Build a commit message from the output of `git status --porcelain`.
fn commit_message(status: &str) -> String {
    let mut message = String::from(COMMIT_HEADER);

    for line in status.lines().filter(|line| line.len() > 3) {
        let (code, path) = line.split_at(2);
        message.push_str(&format!(
            "\n    {} -- {}",
            path.trim_start(),
            describe_status(code)
        ));
    }

    message
}

/// A `Repository` which commits every mutation of another repository to git.
///
/// After each successful mutating call, all changes in the working tree are staged and committed
/// with a message listing the changed paths, and the commit is pushed to every remote using a
/// `<branch>:<remote>` refspec. Changes left behind by a call which failed partway are committed
/// as well. If nothing changed, nothing is committed. A failed push is logged
/// as a warning and the local commit is kept; a failed stage or commit is returned as an error.
///
/// Reads are delegated to the wrapped repository directly.
///
/// You can use [`GitConfig::wrap`] to create a repository of this type.
///
/// [`GitConfig::wrap`]: crate::git::GitConfig::wrap
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "git-versioning")))]
pub struct GitVersioned<R> {
    inner: R,
    git: GitCommand,
}

impl<R: Repository> GitVersioned<R> {
    pub(super) fn new(inner: R, config: &GitConfig) -> crate::Result<Self> {
        let root = match (&config.path, inner.storage_root()) {
            (Some(path), _) => path.clone(),
            (None, Some(root)) => root.to_path_buf(),
            (None, None) => return Err(crate::Error::InvalidPath),
        };
        create_dir_all(&root)?;

        let git = GitCommand::new(root);

        if git.root().join(".git").exists() {
            match git.run(&["symbolic-ref", "--short", "HEAD"]) {
                Ok(branch) if branch.trim() == config.branch => (),
                Ok(branch) => warn!(
                    root = %git.root().display(),
                    branch = %branch.trim(),
                    expected = %config.branch,
                    "The git repository is on an unexpected branch."
                ),
                Err(error) => warn!(
                    root = %git.root().display(),
                    %error,
                    "The git repository is not on a branch."
                ),
            }
        } else {
            git.run(&["init", "--quiet"])?;
            let head = format!("refs/heads/{}", config.branch);
            git.run(&["symbolic-ref", "HEAD", &head])?;
            info!(
                root = %git.root().display(),
                branch = %config.branch,
                "Initialized a git repository."
            );
        }

        git.run(&["config", "user.name", &config.name])?;
        git.run(&["config", "user.email", &config.email])?;

        let existing = git.run(&["remote"])?;
        for remote in &config.remotes {
            if existing.lines().any(|name| name.trim() == remote.name) {
                continue;
            }
            let url = remote.authenticated_url();
            git.run(&["remote", "add", &remote.name, &url])?;
            info!(
                remote = %remote.name,
                url = %redact_url(&url),
                "Registered a git remote."
            );
        }

        Ok(GitVersioned { inner, git })
    }

    /// The wrapped repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Consume this wrapper and return the wrapped repository.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// The root of the git working tree.
    pub fn root(&self) -> &Path {
        self.git.root()
    }

    /// Return the messages of the commits on the current branch, newest first.
    ///
    /// # Errors
    /// - `Error::Git`: A git command failed.
    pub fn history(&self) -> crate::Result<Vec<String>> {
        if !self
            .git
            .succeeds(&["rev-parse", "--verify", "--quiet", "HEAD"])?
        {
            return Ok(Vec::new());
        }

        let log = self.git.run(&["log", "--format=%B%x00"])?;
        Ok(log
            .split('\0')
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(String::from)
            .collect())
    }

    /// Stage and commit every change in the working tree, then push the commit.
    fn commit(&self) -> crate::Result<()> {
        self.git.run(&["add", "--all"])?;

        let status = self.git.run(&["status", "--porcelain"])?;
        if status.trim().is_empty() {
            debug!(root = %self.root().display(), "Nothing to commit.");
            return Ok(());
        }

        let message = commit_message(&status);
        self.git
            .run(&["-c", "commit.gpgsign=false", "commit", "--quiet", "-m", &message])?;
        debug!(root = %self.root().display(), "Committed changes.");

        self.push();

        Ok(())
    }

    /// Push the current branch to every remote, logging failures.
    fn push(&self) {
        let branch = match self.git.run(&["symbolic-ref", "--short", "HEAD"]) {
            Ok(branch) => branch.trim().to_string(),
            Err(error) => {
                warn!(%error, "Could not determine the current branch.");
                return;
            }
        };

        let remotes = match self.git.run(&["remote"]) {
            Ok(remotes) => remotes,
            Err(error) => {
                warn!(%error, "Could not list git remotes.");
                return;
            }
        };

        for remote in remotes.lines().map(str::trim).filter(|name| !name.is_empty()) {
            let refspec = format!("{}:{}", branch, remote);
            match self.git.run(&["push", "--quiet", remote, &refspec]) {
                Ok(_) => debug!(%remote, %refspec, "Pushed changes."),
                Err(error) => warn!(%remote, %refspec, %error, "Could not push changes."),
            }
        }
    }

    /// Commit whatever `result`'s call changed and return `result`.
    ///
    /// A bulk call can fail after changing some records, so the working tree is committed on
    /// failure too. An error while committing after a failed call is logged and the original
    /// error is returned.
    fn committed<T>(&self, result: crate::Result<T>) -> crate::Result<T> {
        match result {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(error) => {
                if let Err(commit_error) = self.commit() {
                    warn!(error = %commit_error, "Could not commit changes of a failed call.");
                }
                Err(error)
            }
        }
    }
}

impl<R: Repository> Repository for GitVersioned<R> {
    fn kind(&self) -> EntityKind {
        self.inner.kind()
    }

    fn id_kind(&self) -> IdKind {
        self.inner.id_kind()
    }

    fn storage_root(&self) -> Option<&Path> {
        self.inner.storage_root()
    }

    fn create(&mut self, entity: &Entity) -> crate::Result<RecordId> {
        let result = self.inner.create(entity);
        self.committed(result)
    }

    fn find_by_id(&self, id: &RecordId) -> crate::Result<Option<Entity>> {
        self.inner.find_by_id(id)
    }

    fn find_all(&self) -> crate::Result<Vec<Entity>> {
        self.inner.find_all()
    }

    fn update_by_id(&mut self, id: &RecordId, update: &Entity) -> crate::Result<Option<RecordId>> {
        let result = self.inner.update_by_id(id, update);
        self.committed(result)
    }

    fn remove_by_id(&mut self, id: &RecordId) -> crate::Result<Option<RecordId>> {
        let result = self.inner.remove_by_id(id);
        self.committed(result)
    }

    fn remove_all(&mut self) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.remove_all();
        self.committed(result)
    }

    fn find_one(&self, entity: &Entity) -> crate::Result<Option<Entity>> {
        self.inner.find_one(entity)
    }

    fn find_by_ids(&self, ids: &[RecordId]) -> crate::Result<Vec<Entity>> {
        self.inner.find_by_ids(ids)
    }

    fn find_by_crit(&self, criteria: &Entity) -> crate::Result<Vec<Entity>> {
        self.inner.find_by_crit(criteria)
    }

    fn find(&self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<Entity>> {
        self.inner.find(ids, criteria)
    }

    fn update_by_ids(
        &mut self,
        ids: &[RecordId],
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.update_by_ids(ids, update);
        self.committed(result)
    }

    fn update_by_crit(&mut self, criteria: &Entity, update: &Entity) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.update_by_crit(criteria, update);
        self.committed(result)
    }

    fn update(
        &mut self,
        ids: &[RecordId],
        criteria: &Entity,
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.update(ids, criteria, update);
        self.committed(result)
    }

    fn remove_by_ids(&mut self, ids: &[RecordId]) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.remove_by_ids(ids);
        self.committed(result)
    }

    fn remove_by_crit(&mut self, criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.remove_by_crit(criteria);
        self.committed(result)
    }

    fn remove(&mut self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        let result = self.inner.remove(ids, criteria);
        self.committed(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lists_changed_paths() {
        let status = "A  sites/mail.json\nM  bank.json\nD  old.json\n";
        assert_eq!(
            commit_message(status),
            "Committed changes:\n    sites/mail.json -- added\n    bank.json -- modified\n    old.json -- deleted"
        );
    }

    #[test]
    fn untracked_paths_are_described() {
        assert_eq!(describe_status("??"), "untracked");
        assert_eq!(describe_status(" M"), "modified");
    }
}
