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

#![cfg(feature = "store-document")]

use std::fs;

use serde_json::{json, Value};

use common::*;
use vault_store::entity::{Entity, MASTER, VAULT};
use vault_store::store::{DocumentConfig, DocumentStore, OpenRepo, Repository};
use vault_store::{IdKind, RecordId};

mod common;

fn read_document(store: &WithTempDir<DocumentStore>) -> anyhow::Result<Value> {
    let contents = fs::read_to_string(store.path().join("db.json"))?;
    Ok(serde_json::from_str(&contents)?)
}

#[rstest]
fn opening_creates_empty_document(
    document_store: WithTempDir<DocumentStore>,
) -> anyhow::Result<()> {
    assert_eq!(read_document(&document_store)?, json!({}));
    assert_eq!(document_store.id_kind(), IdKind::Int);
    assert_eq!(document_store.table(), "vault");
    assert_eq!(document_store.storage_root(), Some(document_store.path()));
    Ok(())
}

#[rstest]
fn records_are_stored_by_table_and_id(
    mut document_store: WithTempDir<DocumentStore>,
) -> anyhow::Result<()> {
    let entity = Entity::new(VAULT).with("site", "x.com").with("pw", "q1");
    document_store.create(&entity)?;

    assert_eq!(
        read_document(&document_store)?,
        json!({ "vault": { "1": { "site": "x.com", "pw": "q1" } } })
    );
    Ok(())
}

#[rstest]
fn ids_are_sequential(mut document_store: WithTempDir<DocumentStore>) -> anyhow::Result<()> {
    let entity = Entity::new(VAULT).with("site", "x.com");

    assert_eq!(document_store.create(&entity)?, RecordId::Int(1));
    assert_eq!(document_store.create(&entity)?, RecordId::Int(2));
    assert_eq!(document_store.create(&entity)?, RecordId::Int(3));

    document_store.remove_by_id(&RecordId::Int(2))?;
    assert_eq!(document_store.create(&entity)?, RecordId::Int(4));

    Ok(())
}

#[rstest]
fn provided_ids_are_honored(mut document_store: WithTempDir<DocumentStore>) -> anyhow::Result<()> {
    let entity = Entity::new(VAULT).with("site", "x.com");

    assert_eq!(
        document_store.create(&entity.clone().with_id(7u64))?,
        RecordId::Int(7)
    );
    assert_eq!(document_store.create(&entity)?, RecordId::Int(8));

    Ok(())
}

#[rstest]
fn exhausted_ids_are_reported(mut document_store: WithTempDir<DocumentStore>) -> anyhow::Result<()> {
    let entity = Entity::new(VAULT).with("site", "x.com");
    document_store.create(&entity.clone().with_id(u64::MAX))?;

    assert_that!(document_store.create(&entity)).is_err_variant(vault_store::Error::IdsExhausted);
    assert_that!(document_store.find_all()?).has_length(1);

    Ok(())
}

#[rstest]
fn duplicate_ids_are_rejected(mut document_store: WithTempDir<DocumentStore>) -> anyhow::Result<()> {
    let entity = Entity::new(VAULT).with("site", "x.com").with_id(1u64);
    document_store.create(&entity)?;

    assert_that!(document_store.create(&entity)).is_err_variant(vault_store::Error::AlreadyExists);
    Ok(())
}

#[rstest]
fn key_ids_are_rejected(mut document_store: WithTempDir<DocumentStore>) {
    let entity = Entity::new(VAULT).with("site", "x.com").with_id("mail");

    assert_that!(document_store.create(&entity)).is_err_variant(vault_store::Error::IdType {
        expected: IdKind::Int,
    });
    assert_that!(document_store.find_by_id(&RecordId::from("mail"))).is_err_variant(
        vault_store::Error::IdType {
            expected: IdKind::Int,
        },
    );
}

#[rstest]
fn other_tables_are_preserved(document_store: WithTempDir<DocumentStore>) -> anyhow::Result<()> {
    let path = document_store.path().join("db.json");
    let mut masters = DocumentConfig::new(&path).open(MASTER)?;
    masters.create(&Entity::new(MASTER).with("user", "ann").with("pw", "m1"))?;

    let mut vault = DocumentConfig::new(&path).open(VAULT)?;
    let id = vault.create(&Entity::new(VAULT).with("site", "x.com"))?;
    vault.remove_by_id(&id)?;

    assert_eq!(
        read_document(&document_store)?,
        json!({
            "master": { "1": { "user": "ann", "pw": "m1" } },
            "vault": {}
        })
    );
    assert_that!(masters.find_all()?).has_length(1);

    Ok(())
}

#[rstest]
fn unchanged_records_are_not_rewritten(
    mut document_store: WithTempDir<DocumentStore>,
) -> anyhow::Result<()> {
    let path = document_store.path().join("db.json");
    let id = document_store.create(&Entity::new(VAULT).with("site", "x.com"))?;
    let before = fs::read(&path)?;

    let update = Entity::new(VAULT).with("site", "x.com");
    assert_eq!(document_store.update_by_id(&id, &update)?, Some(id));
    assert_eq!(fs::read(&path)?, before);

    Ok(())
}

#[rstest]
fn custom_table_names_are_used(document_store: WithTempDir<DocumentStore>) -> anyhow::Result<()> {
    let config = DocumentConfig {
        path: document_store.path().join("db.json"),
        table: Some(String::from("entries")),
    };
    let mut store = config.open(VAULT)?;
    store.create(&Entity::new(VAULT).with("site", "x.com"))?;

    assert_eq!(
        read_document(&document_store)?,
        json!({ "entries": { "1": { "site": "x.com" } } })
    );
    Ok(())
}

#[test]
fn corrupt_documents_are_rejected() -> anyhow::Result<()> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("db.json");

    fs::write(&path, "[1, 2, 3]")?;
    assert_that!(DocumentConfig::new(&path).open(VAULT).map(|_| ()))
        .is_err_variant(vault_store::Error::Corrupt);

    fs::write(&path, r#"{ "vault": { "one": {} } }"#)?;
    let store = DocumentConfig::new(&path).open(VAULT)?;
    assert_that!(store.find_all()).is_err_variant(vault_store::Error::Corrupt);

    Ok(())
}

#[test]
fn unparseable_documents_are_rejected() -> anyhow::Result<()> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("db.json");
    fs::write(&path, "{ not json")?;

    let error = DocumentConfig::new(&path).open(VAULT).unwrap_err();
    assert!(matches!(error, vault_store::Error::Deserialize(_)));

    Ok(())
}
