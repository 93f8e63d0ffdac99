//! Fixture lifecycle: state arranged before a scenario and removed after it
//!
//! Setup is strict: a record that cannot be created (or read back
//! identically) aborts the scenario with a `SetupFailed` failure. Teardown is
//! best effort on status, since the scenario body may already have removed
//! the record, but transport errors still propagate.

use charsuite_core::record::record_name;
use charsuite_core::{Credentials, FailureType, Record, wrap_result};
use serde_json::Value;

use crate::assertions::{StepError, StepResult, failure};
use crate::client::ApiClient;
use crate::scenarios::ScenarioContext;

/// A setup or teardown action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// POST every `post_characters` record
    CreateSeveral,
    /// DELETE every `post_characters` record
    DeleteSeveral,
    /// POST `post_characters[1]`
    CreateSecond,
    /// DELETE `post_characters[1]`
    DeleteSecond,
    /// DELETE the wrong-field-order record
    DeleteWrongOrder,
    /// DELETE every `many_chars_manipulations` record
    DeleteBatch,
    /// DELETE the name-only record
    DeleteOnlyRequired,
    /// POST every `standard_character` record
    CreateStandard,
    /// Wipe the whole collection
    ResetDatabase,
}

impl Hook {
    /// Run the hook against the service.
    ///
    /// # Errors
    ///
    /// Create hooks fail when the service does not answer 200. Every hook
    /// fails on transport errors.
    pub fn apply(self, ctx: &ScenarioContext<'_>) -> StepResult {
        let payloads = &ctx.fixtures.payloads;
        tracing::debug!(scenario = ctx.id, hook = ?self, "applying hook");
        match self {
            Self::CreateSeveral => create_all(ctx, &payloads.post_characters),
            Self::DeleteSeveral => delete_all(ctx, &payloads.post_characters),
            Self::CreateSecond => create_all(ctx, second(&payloads.post_characters)),
            Self::DeleteSecond => delete_all(ctx, second(&payloads.post_characters)),
            Self::DeleteWrongOrder => {
                delete_all(ctx, std::slice::from_ref(&payloads.wrong_order_of_fields))
            }
            Self::DeleteBatch => delete_all(ctx, &payloads.many_chars_manipulations),
            Self::DeleteOnlyRequired => {
                delete_all(ctx, std::slice::from_ref(&payloads.only_required_name))
            }
            Self::CreateStandard => create_all(ctx, &payloads.standard_character),
            Self::ResetDatabase => {
                let resp = ctx.client.delete_all_characters(ctx.creds)?;
                if !resp.compare_status_code(200) {
                    tracing::warn!(
                        scenario = ctx.id,
                        status = resp.status_code(),
                        "reset after scenario did not return 200"
                    );
                }
                Ok(())
            }
        }
    }
}

fn second(records: &[Record]) -> &[Record] {
    records.get(1..2).unwrap_or_default()
}

fn create_all(ctx: &ScenarioContext<'_>, records: &[Record]) -> StepResult {
    for record in records {
        let resp = ctx
            .client
            .post_character_by_body(&Value::Object(record.clone()), ctx.creds)?;
        if !resp.compare_status_code(200) {
            return Err(failure(ctx.id, FailureType::SetupFailed, &resp)
                .with_expected_status(200)
                .with_context(
                    "message",
                    format!(
                        "setup could not create {}: status {}",
                        record_name(record).unwrap_or("<unnamed>"),
                        resp.status_code()
                    ),
                )
                .into());
        }
    }
    Ok(())
}

fn delete_all(ctx: &ScenarioContext<'_>, records: &[Record]) -> StepResult {
    for name in records.iter().filter_map(record_name) {
        let resp = ctx.client.delete_character(name, ctx.creds)?;
        if !resp.compare_status_code(200) {
            tracing::debug!(
                scenario = ctx.id,
                name,
                status = resp.status_code(),
                "teardown delete skipped"
            );
        }
    }
    Ok(())
}

/// Create each record, reading every accepted one back; return the
/// collection size afterwards.
///
/// # Errors
///
/// A created record that cannot be read back identically is a
/// `SetupFailed` failure. Transport errors propagate.
pub fn count_after_create_chars(
    id: &str,
    client: &ApiClient,
    creds: &Credentials,
    records: &[Record],
) -> Result<usize, StepError> {
    for record in records {
        let created = client.post_character_by_body(&Value::Object(record.clone()), creds)?;
        if !created.compare_status_code(200) {
            continue;
        }
        let name = record_name(record).unwrap_or_default();
        let resp = client.get_character_by_name(name, creds)?;
        let expected = wrap_result(record.clone());
        if !resp.compare_status_code(200) || !resp.compare_body(&expected) {
            return Err(failure(id, FailureType::SetupFailed, &resp)
                .with_expected_status(200)
                .with_context("expected", expected.to_string())
                .with_context("actual", resp.text())
                .with_context("message", format!("{name} was not posted"))
                .into());
        }
    }
    let resp = client.get_all_characters(creds)?;
    Ok(resp.count_all_characters())
}
