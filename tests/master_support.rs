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

use serde_json::json;

use common::*;
use vault_store::entity::{Entity, DELETE, MASTER, UID_FIELD};
use vault_store::store::{MemoryConfig, OpenRepo, Repository};
use vault_store::support::{MasterKey, MasterSupport};
use vault_store::{IdKind, RecordId};

mod common;

fn alice() -> Entity {
    Entity::new(MASTER)
        .with("user", "alice")
        .with("token", "t1")
        .with("pw", "p1")
        .with("salt", "s1")
}

fn open(backend: Backend) -> Option<WithTempDir<MasterSupport<Box<dyn Repository>>>> {
    backend
        .open(MASTER)
        .map(|repo| repo.map(MasterSupport::new))
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::document(Backend::Document)]
fn master_password_lifecycle(#[case] backend: Backend) -> anyhow::Result<()> {
    let mut support = match open(backend) {
        Some(support) => support,
        None => return Ok(()),
    };

    let id = support.create_master_password(alice())?;
    assert_eq!(id, RecordId::Int(1));

    assert_that!(support.create_master_password(alice().with("pw", "other")))
        .is_err_variant(vault_store::Error::MasterPasswordExists(String::new()));
    assert_that!(support.repo().find_all()?).has_length(1);

    let master = support.read_master_password(MasterKey::Id(id.clone()))?;
    assert_eq!(master.get("pw"), Some(&json!("p1")));

    let update = Entity::new(MASTER).with("pw", "p2");
    assert_eq!(support.update_master_password(&id, &update)?, id);

    let master = support.read_master_password(MasterKey::Id(id))?;
    assert_eq!(master.get("pw"), Some(&json!("p2")));
    assert_eq!(master.get("salt"), Some(&json!("s1")));

    Ok(())
}

#[rstest]
#[case::filesystem(Backend::Filesystem)]
#[case::git_filesystem(Backend::GitFilesystem)]
fn keys_are_generated_when_required(#[case] backend: Backend) -> anyhow::Result<()> {
    let mut support = match open(backend) {
        Some(support) => support,
        None => return Ok(()),
    };

    let id = support.create_master_password(alice())?;
    assert_eq!(id.kind(), IdKind::Key);

    let master = support.read_master_password(MasterKey::User(String::from("alice")))?;
    assert_eq!(master.id(), Some(&id));
    assert_eq!(master.get("token"), Some(&json!("t1")));

    assert_that!(support.create_master_password(alice()))
        .is_err_variant(vault_store::Error::MasterPasswordExists(String::new()));

    Ok(())
}

#[test]
fn users_are_required() {
    let mut support = MasterSupport::new(MemoryConfig::new().open(MASTER).unwrap());
    let entity = Entity::new(MASTER).with("pw", "p1");

    assert_that!(support.create_master_password(entity))
        .is_err_variant(vault_store::Error::MissingField(String::new()));
}

#[test]
fn distinct_users_each_get_a_master_password() -> anyhow::Result<()> {
    let mut support = MasterSupport::new(MemoryConfig::new().open(MASTER)?);

    let first = support.create_master_password(alice())?;
    let second = support.create_master_password(alice().with("user", "bob"))?;

    assert_ne!(first, second);
    let bob = support.read_master_password(MasterKey::User(String::from("bob")))?;
    assert_eq!(bob.id(), Some(&second));

    Ok(())
}

#[test]
fn unknown_master_passwords_are_not_found() {
    let support = MasterSupport::new(MemoryConfig::new().open(MASTER).unwrap());

    assert_that!(support.read_master_password(MasterKey::User(String::from("nobody"))))
        .is_err_variant(vault_store::Error::UserNotExists(String::new()));
    assert_that!(support.read_master_password(MasterKey::Id(RecordId::Int(99))))
        .is_err_variant(vault_store::Error::UserNotExists(String::new()));
    assert_that!(support.read_master_password(MasterKey::Id(RecordId::from("alice"))))
        .is_err_variant(vault_store::Error::IdType {
            expected: IdKind::Int,
        });
}

#[test]
fn duplicate_users_are_reported() -> anyhow::Result<()> {
    let mut repo = MemoryConfig::new().open(MASTER)?;
    repo.create(&alice())?;
    repo.create(&alice())?;
    let support = MasterSupport::new(repo);

    let result = support.read_master_password(MasterKey::User(String::from("alice")));
    assert!(matches!(
        result,
        Err(vault_store::Error::MultipleMasterPasswords { count: 2, .. })
    ));

    Ok(())
}

#[test]
fn immutable_fields_are_not_updated() -> anyhow::Result<()> {
    let mut support = MasterSupport::new(MemoryConfig::new().open(MASTER)?);
    let id = support.create_master_password(alice())?;

    for update in vec![
        Entity::new(MASTER).with("user", "bob"),
        Entity::new(MASTER).with("pw", "p2").with("token", "t2"),
        Entity::new(MASTER).with("token", DELETE),
    ] {
        assert_that!(support.update_master_password(&id, &update))
            .is_err_variant(vault_store::Error::InvalidUpdate(String::new()));
    }

    let master = support.read_master_password(MasterKey::Id(id))?;
    assert_eq!(master.get("user"), Some(&json!("alice")));
    assert_eq!(master.get("token"), Some(&json!("t1")));
    assert_eq!(master.get("pw"), Some(&json!("p1")));

    Ok(())
}

#[test]
fn updating_missing_master_password_fails() {
    let mut support = MasterSupport::new(MemoryConfig::new().open(MASTER).unwrap());
    let update = Entity::new(MASTER).with("pw", "p2");

    assert_that!(support.update_master_password(&RecordId::Int(1), &update))
        .is_err_variant(vault_store::Error::UserNotExists(String::new()));
}

#[test]
fn protected_fields_are_not_returned() -> anyhow::Result<()> {
    let mut support = MasterSupport::new(MemoryConfig::new().open(MASTER)?);
    let id = support.create_master_password(alice().with(UID_FIELD, 7))?;

    let master = support.read_master_password(MasterKey::Id(id.clone()))?;
    assert!(!master.contains(UID_FIELD));
    assert_eq!(master.id(), Some(&id));

    Ok(())
}
