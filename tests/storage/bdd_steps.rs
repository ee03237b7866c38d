//! BDD step definitions for storage resource handlers.

use occi_storage::test_support::{PlatformCall, volume_record};
use occi_storage::{AttributeMap, StorageAction, StorageAttributes, VolumeStatus};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{StorageContext, StorageResult};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("runtime setup failed: {0}")]
    Runtime(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Runtime(err.to_string()))
}

fn identified(id: String) -> StorageAttributes {
    StorageAttributes {
        id: Some(id),
        ..StorageAttributes::default()
    }
}

#[given("a scripted volume platform")]
fn scripted_platform(storage_context: &StorageContext) {
    assert!(storage_context.platform.calls().is_empty());
}

#[given("new volumes settle as \"{status}\"")]
fn volumes_settle_as(storage_context: &StorageContext, status: String) {
    storage_context
        .platform
        .set_status_after_create(VolumeStatus::from(status));
}

#[given("a volume \"{id}\" named \"{name}\" of \"{size}\" GiB with status \"{status}\"")]
fn existing_volume(
    storage_context: &StorageContext,
    id: String,
    name: String,
    size: u32,
    status: String,
) {
    storage_context
        .platform
        .insert_volume(volume_record(&id, &name, size, &status));
}

#[when("I create a storage resource of size \"{size}\" titled \"{title}\"")]
fn create_storage(
    storage_context: &StorageContext,
    size: String,
    title: String,
) -> Result<(), StepError> {
    let attributes = StorageAttributes {
        size: Some(size),
        title: Some(title),
        ..StorageAttributes::default()
    };
    let context = storage_context.request_context();
    let result = runtime()?.block_on(storage_context.backend.create(&attributes, &context));
    let entity = storage_context.record(result);
    storage_context.entity.replace(entity);
    Ok(())
}

#[when("I retrieve storage \"{id}\"")]
fn retrieve_storage(storage_context: &StorageContext, id: String) -> Result<(), StepError> {
    let attributes = identified(id);
    let context = storage_context.request_context();
    let result = runtime()?.block_on(storage_context.backend.retrieve(&attributes, &context));
    let entity = storage_context.record(result);
    storage_context.entity.replace(entity);
    Ok(())
}

#[when("I run the \"{action}\" action")]
fn run_action(storage_context: &StorageContext, action: String) -> Result<(), StepError> {
    let action: StorageAction = action
        .parse()
        .map_err(|err: occi_storage::AttributeError| StepError::Assertion(err.to_string()))?;
    let entity = storage_context
        .entity
        .borrow()
        .clone()
        .ok_or_else(|| StepError::Assertion(String::from("no storage entity retrieved")))?;
    let context = storage_context.request_context();
    let result = runtime()?.block_on(storage_context.backend.action(
        &entity,
        action,
        &AttributeMap::new(),
        &context,
    ));
    storage_context.record(result);
    Ok(())
}

#[when("I delete storage \"{id}\"")]
fn delete_storage(storage_context: &StorageContext, id: String) -> Result<(), StepError> {
    let attributes = identified(id);
    let context = storage_context.request_context();
    let result = runtime()?.block_on(storage_context.backend.delete(&attributes, &context));
    storage_context.record(result);
    Ok(())
}

#[then("the storage request succeeds")]
fn request_succeeds(storage_context: &StorageContext) -> Result<(), StepError> {
    match storage_context.outcome.borrow().as_ref() {
        Some(StorageResult::Success) => Ok(()),
        Some(StorageResult::Failure(failure)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {}",
            failure.message
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the storage request fails with status \"{status}\"")]
fn request_fails(storage_context: &StorageContext, status: u16) -> Result<(), StepError> {
    let outcome = storage_context.outcome.borrow();
    let Some(StorageResult::Failure(failure)) = outcome.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected failure outcome",
        )));
    };
    if failure.status == status {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected status {status}, got {} ({})",
            failure.status, failure.message
        )))
    }
}

#[then("the storage error mentions \"{text}\"")]
fn error_mentions(storage_context: &StorageContext, text: String) -> Result<(), StepError> {
    match storage_context.outcome.borrow().as_ref() {
        Some(StorageResult::Failure(failure)) if failure.message.contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an error mentioning {text}, got {other:?}"
        ))),
    }
}

fn rendered_attribute(
    storage_context: &StorageContext,
    read: impl FnOnce(&occi_storage::StorageEntity) -> Option<String>,
) -> Result<Option<String>, StepError> {
    storage_context
        .entity
        .borrow()
        .as_ref()
        .map(read)
        .ok_or_else(|| StepError::Assertion(String::from("no storage entity returned")))
}

fn expect_attribute(actual: Option<String>, expected: &str, name: &str) -> Result<(), StepError> {
    if actual.as_deref() == Some(expected) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {name} {expected}, got {actual:?}"
        )))
    }
}

#[then("the storage location is \"{location}\"")]
fn storage_location(storage_context: &StorageContext, location: String) -> Result<(), StepError> {
    let actual = rendered_attribute(storage_context, |entity| entity.location.clone())?;
    expect_attribute(actual, &location, "location")
}

#[then("the storage state is \"{state}\"")]
fn storage_state(storage_context: &StorageContext, state: String) -> Result<(), StepError> {
    let actual = rendered_attribute(storage_context, |entity| {
        entity.attributes.state.map(|value| value.as_str().to_owned())
    })?;
    expect_attribute(actual, &state, "state")
}

#[then("the storage size is \"{size}\"")]
fn storage_size(storage_context: &StorageContext, size: String) -> Result<(), StepError> {
    let actual = rendered_attribute(storage_context, |entity| entity.attributes.size.clone())?;
    expect_attribute(actual, &size, "size")
}

#[then("the storage title is \"{title}\"")]
fn storage_title(storage_context: &StorageContext, title: String) -> Result<(), StepError> {
    let actual = rendered_attribute(storage_context, |entity| entity.attributes.title.clone())?;
    expect_attribute(actual, &title, "title")
}

#[then("the storage actions are \"{actions}\"")]
fn storage_actions(storage_context: &StorageContext, actions: String) -> Result<(), StepError> {
    let actual = rendered_attribute(storage_context, |entity| {
        Some(
            entity
                .actions
                .iter()
                .map(StorageAction::term)
                .collect::<Vec<_>>()
                .join(","),
        )
    })?;
    expect_attribute(actual, &actions, "actions")
}

#[then("a snapshot named \"{name}\" described as \"{description}\" was requested")]
fn snapshot_requested(
    storage_context: &StorageContext,
    name: String,
    description: String,
) -> Result<(), StepError> {
    let requested = storage_context.platform.calls().into_iter().any(|call| {
        matches!(
            call,
            PlatformCall::SnapshotVolume(ref request)
                if request.name == name && request.description == description
        )
    });
    if requested {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected snapshot {name} ({description}), calls: {:?}",
            storage_context.platform.calls()
        )))
    }
}

#[then("the platform saw no \"{operation}\" calls")]
fn no_calls(storage_context: &StorageContext, operation: String) -> Result<(), StepError> {
    expect_calls(storage_context, &operation, 0)
}

#[then("the platform saw exactly \"{count}\" \"{operation}\" calls")]
fn exact_calls(
    storage_context: &StorageContext,
    count: usize,
    operation: String,
) -> Result<(), StepError> {
    expect_calls(storage_context, &operation, count)
}

fn expect_calls(
    storage_context: &StorageContext,
    operation: &str,
    expected: usize,
) -> Result<(), StepError> {
    let actual = storage_context.platform.call_count(operation);
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected} {operation} calls, got {actual}"
        )))
    }
}
