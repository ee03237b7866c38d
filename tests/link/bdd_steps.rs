//! BDD step definitions for storage link handlers.

use occi_storage::StorageLinkRequest;
use occi_storage::registry::compute_path;
use occi_storage::test_support::volume_record;
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{LinkContext, LinkResult};

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

#[given("a scripted link platform")]
fn scripted_platform(link_context: &LinkContext) {
    assert!(link_context.platform.calls().is_empty());
}

#[given("compute \"{instance}\" is registered")]
fn compute_registered(link_context: &LinkContext, instance: String) {
    link_context.registry.insert(compute_path(&instance));
}

#[given("a link volume \"{id}\" with status \"{status}\"")]
fn link_volume(link_context: &LinkContext, id: String, status: String) {
    link_context
        .platform
        .insert_volume(volume_record(&id, "data", 10, &status));
}

#[given("the platform assigns device \"{device}\"")]
fn platform_assigns_device(link_context: &LinkContext, device: String) {
    link_context.platform.set_assigned_device(device);
}

#[given("the platform fails on \"attach_volume\"")]
fn attach_fails(link_context: &LinkContext) {
    link_context.platform.fail_on("attach_volume");
}

#[when("I link compute \"{instance}\" to volume \"{volume}\" on device \"{device}\"")]
fn link_volume_to_compute(
    link_context: &LinkContext,
    instance: String,
    volume: String,
    device: String,
) -> Result<(), StepError> {
    let request = StorageLinkRequest::new(instance, volume)
        .device_id(Some(device));
    let context = link_context.request_context();
    let result = runtime()?.block_on(link_context.backend.create(&request, &context));
    let link = link_context.record(result);
    link_context.link.replace(link);
    Ok(())
}

#[when("I unlink compute \"{instance}\" from volume \"{volume}\"")]
fn unlink(link_context: &LinkContext, instance: String, volume: String) -> Result<(), StepError> {
    let request = StorageLinkRequest::new(instance, volume);
    let context = link_context.request_context();
    let result = runtime()?.block_on(link_context.backend.delete(&request, &context));
    link_context.record(result);
    Ok(())
}

#[then("the link request succeeds")]
fn request_succeeds(link_context: &LinkContext) -> Result<(), StepError> {
    match link_context.outcome.borrow().as_ref() {
        Some(LinkResult::Success) => Ok(()),
        Some(LinkResult::Failure { message, .. }) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the link request fails with status \"{status}\"")]
fn request_fails(link_context: &LinkContext, status: u16) -> Result<(), StepError> {
    match link_context.outcome.borrow().as_ref() {
        Some(LinkResult::Failure { status: actual, .. }) if *actual == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure with status {status}, got {other:?}"
        ))),
    }
}

fn with_link<T>(
    link_context: &LinkContext,
    read: impl FnOnce(&occi_storage::StorageLink) -> T,
) -> Result<T, StepError> {
    link_context
        .link
        .borrow()
        .as_ref()
        .map(read)
        .ok_or_else(|| StepError::Assertion(String::from("no link returned")))
}

#[then("the link id is \"{id}\"")]
fn link_id_is(link_context: &LinkContext, id: String) -> Result<(), StepError> {
    let actual = with_link(link_context, |link| link.id.clone())?;
    if actual == id {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected link id {id}, got {actual}")))
    }
}

#[then("the link device is \"{device}\"")]
fn link_device_is(link_context: &LinkContext, device: String) -> Result<(), StepError> {
    let actual = with_link(link_context, |link| link.device_id.clone())?;
    if actual.as_deref() == Some(device.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected device {device}, got {actual:?}"
        )))
    }
}

#[then("the link is attached")]
fn link_attached(link_context: &LinkContext) -> Result<(), StepError> {
    if with_link(link_context, |link| link.attached)? {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from("link should be attached")))
    }
}

#[then("the link is not attached")]
fn link_not_attached(link_context: &LinkContext) -> Result<(), StepError> {
    if with_link(link_context, |link| link.attached)? {
        Err(StepError::Assertion(String::from(
            "link should wait for the instance",
        )))
    } else {
        Ok(())
    }
}

#[then("the link platform saw no \"{operation}\" calls")]
fn no_calls(link_context: &LinkContext, operation: String) -> Result<(), StepError> {
    expect_calls(link_context, &operation, 0)
}

#[then("the link platform saw exactly \"{count}\" \"{operation}\" calls")]
fn exact_calls(
    link_context: &LinkContext,
    count: usize,
    operation: String,
) -> Result<(), StepError> {
    expect_calls(link_context, &operation, count)
}

fn expect_calls(
    link_context: &LinkContext,
    operation: &str,
    expected: usize,
) -> Result<(), StepError> {
    let actual = link_context.platform.call_count(operation);
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected} {operation} calls, got {actual}"
        )))
    }
}
