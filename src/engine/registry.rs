//! Registration phase.
//!
//! Groups and checks are collected here before any run. Handing the
//! registry to [`Runner::new`](crate::engine::runner::Runner::new) ends
//! registration, so checks can never be added while a run is in progress.

use crate::engine::check::Check;
use crate::engine::group::ChecksGroup;
use crate::error::RegistryError;
use std::collections::HashSet;

/// Groups in registration order, which is also the run order.
#[derive(Debug, Default)]
pub struct Registry {
    groups: Vec<ChecksGroup>,
    check_ids: HashSet<String>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty group, typically to attach hooks before its checks
    /// arrive.
    pub fn add_group(&mut self, group: ChecksGroup) -> Result<(), RegistryError> {
        if self.group_index(group.name()).is_some() {
            return Err(RegistryError::DuplicateGroup {
                group: group.name().to_string(),
            });
        }
        for check in group.checks() {
            if self.check_ids.contains(check.id()) {
                return Err(RegistryError::DuplicateCheck {
                    check_id: check.id().to_string(),
                });
            }
        }
        self.check_ids
            .extend(group.checks().iter().map(|check| check.id().to_string()));
        self.groups.push(group);
        Ok(())
    }

    /// Register `check` into the group it names, creating the group on
    /// first use.
    pub fn add_check(&mut self, check: Check) -> Result<(), RegistryError> {
        if !self.check_ids.insert(check.id().to_string()) {
            return Err(RegistryError::DuplicateCheck {
                check_id: check.id().to_string(),
            });
        }

        let index = match self.group_index(check.group()) {
            Some(index) => index,
            None => {
                self.groups.push(ChecksGroup::new(check.group()));
                self.groups.len() - 1
            }
        };
        tracing::trace!(group = check.group(), check_id = check.id(), "registered check");
        self.groups[index].push(check);
        Ok(())
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.name() == name)
    }

    /// Groups in registration order.
    pub fn groups(&self) -> &[ChecksGroup] {
        &self.groups
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&ChecksGroup> {
        self.groups.iter().find(|group| group.name() == name)
    }

    /// Number of registered checks across all groups.
    pub fn check_count(&self) -> usize {
        self.check_ids.len()
    }

    pub(crate) fn into_groups(self) -> Vec<ChecksGroup> {
        self.groups
    }
}
