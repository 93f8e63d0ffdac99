//! Scenario catalogue
//!
//! Each scenario arranges state through setup hooks, issues client calls,
//! checks status, body and contract, then tears its state down. Scenarios
//! driven by a fixture list expand into one case per record (`name[i]`).

use charsuite_core::record::record_name;
use charsuite_core::workbench::{ACCEPTED_LENGTHS, REJECTED_LENGTHS, make_field_symbols};
use charsuite_core::{Credentials, Fixtures, Marker, Record, wrap_result};
use serde_json::Value;

use crate::assertions::{
    StepResult, expect_body, expect_count, expect_field_rules, expect_headers,
    expect_no_duplicates, expect_raw_text, expect_schema, expect_status,
};
use crate::client::ApiClient;
use crate::contract::Contract;
use crate::lifecycle::{Hook, count_after_create_chars};

/// Everything a running case can touch.
pub struct ScenarioContext<'a> {
    /// Case id, e.g. `create_character[2]`
    pub id: &'a str,
    pub client: &'a ApiClient,
    pub creds: &'a Credentials,
    pub fixtures: &'a Fixtures,
}

type PlainFn = fn(&ScenarioContext<'_>) -> StepResult;
type EachFn = fn(&ScenarioContext<'_>, &Record) -> StepResult;

/// Fixture list a scenario is expanded over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Params {
    PostCharacters,
    ChangedIdentity,
    StandardCharacter,
    /// `post_characters[1]` alone, not indexed in the case id
    ExistingCharacter,
}

impl Params {
    fn records(self, fixtures: &Fixtures) -> &[Record] {
        let p = &fixtures.payloads;
        match self {
            Self::PostCharacters => &p.post_characters,
            Self::ChangedIdentity => &p.changed_identity_for_put,
            Self::StandardCharacter => &p.standard_character,
            Self::ExistingCharacter => p.post_characters.get(1..2).unwrap_or_default(),
        }
    }

    const fn indexed(self) -> bool {
        !matches!(self, Self::ExistingCharacter)
    }
}

#[derive(Clone, Copy)]
enum Body {
    Plain(PlainFn),
    Each(Params, EachFn),
}

pub struct Scenario {
    pub name: &'static str,
    pub marker: Marker,
    pub setup: &'static [Hook],
    pub teardown: &'static [Hook],
    body: Body,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum CaseBody<'f> {
    Plain(PlainFn),
    Each(EachFn, &'f Record),
}

/// One runnable expansion of a scenario.
pub struct ScenarioCase<'f> {
    pub id: String,
    pub scenario: &'static Scenario,
    body: CaseBody<'f>,
}

impl ScenarioCase<'_> {
    #[must_use]
    pub fn marker(&self) -> Marker {
        self.scenario.marker
    }

    /// Run the scenario body (hooks excluded).
    ///
    /// # Errors
    ///
    /// Returns the first broken expectation or transport error.
    pub fn run(&self, ctx: &ScenarioContext<'_>) -> StepResult {
        match self.body {
            CaseBody::Plain(f) => f(ctx),
            CaseBody::Each(f, record) => f(ctx, record),
        }
    }

    /// Selected when its marker is listed (or none are) and its id
    /// contains `filter`.
    #[must_use]
    pub fn matches(&self, markers: &[Marker], filter: Option<&str>) -> bool {
        (markers.is_empty() || markers.contains(&self.scenario.marker))
            && filter.is_none_or(|f| self.id.contains(f))
    }
}

/// Expand the catalogue over the fixture lists, in catalogue order.
#[must_use]
pub fn expand(fixtures: &Fixtures) -> Vec<ScenarioCase<'_>> {
    let mut cases = Vec::new();
    for scenario in CATALOG {
        match scenario.body {
            Body::Plain(f) => cases.push(ScenarioCase {
                id: scenario.name.to_string(),
                scenario,
                body: CaseBody::Plain(f),
            }),
            Body::Each(params, f) => {
                for (idx, record) in params.records(fixtures).iter().enumerate() {
                    let id = if params.indexed() {
                        format!("{}[{idx}]", scenario.name)
                    } else {
                        scenario.name.to_string()
                    };
                    cases.push(ScenarioCase {
                        id,
                        scenario,
                        body: CaseBody::Each(f, record),
                    });
                }
            }
        }
    }
    cases
}

/// Expanded cases passing the marker and id filters.
#[must_use]
pub fn select<'f>(
    fixtures: &'f Fixtures,
    markers: &[Marker],
    filter: Option<&str>,
) -> Vec<ScenarioCase<'f>> {
    expand(fixtures)
        .into_iter()
        .filter(|case| case.matches(markers, filter))
        .collect()
}

const NO_HOOKS: &[Hook] = &[];

pub static CATALOG: &[Scenario] = &[
    Scenario {
        name: "get_character_by_name",
        marker: Marker::HttpFunctional,
        setup: &[Hook::CreateSeveral],
        teardown: &[Hook::DeleteSeveral],
        body: Body::Each(Params::PostCharacters, get_character_by_name),
    },
    Scenario {
        name: "create_character",
        marker: Marker::HttpFunctional,
        setup: NO_HOOKS,
        teardown: &[Hook::DeleteSeveral],
        body: Body::Each(Params::PostCharacters, create_character),
    },
    Scenario {
        name: "delete_character_by_name",
        marker: Marker::HttpFunctional,
        setup: &[Hook::CreateSeveral],
        teardown: NO_HOOKS,
        body: Body::Each(Params::PostCharacters, delete_character_by_name),
    },
    Scenario {
        name: "headers_field",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(headers_field),
    },
    Scenario {
        name: "update_character_identity_by_name",
        marker: Marker::HttpFunctional,
        setup: &[Hook::CreateSecond],
        teardown: &[Hook::DeleteSecond],
        body: Body::Each(Params::ChangedIdentity, update_character_identity_by_name),
    },
    Scenario {
        name: "get_all_characters",
        marker: Marker::HttpFunctional,
        setup: NO_HOOKS,
        teardown: &[Hook::DeleteBatch],
        body: Body::Plain(get_all_characters),
    },
    Scenario {
        name: "get_all_duplicate_chars",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(get_all_duplicate_chars),
    },
    Scenario {
        name: "characters_field_rules",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(characters_field_rules),
    },
    Scenario {
        name: "wrong_authorization",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(wrong_authorization),
    },
    Scenario {
        name: "wrong_url_resource",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(wrong_url_resource),
    },
    Scenario {
        name: "empty_login",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(empty_login),
    },
    Scenario {
        name: "wrong_order_of_field",
        marker: Marker::NegativeCases,
        setup: &[Hook::DeleteWrongOrder],
        teardown: &[Hook::DeleteWrongOrder],
        body: Body::Plain(wrong_order_of_field),
    },
    Scenario {
        name: "delete_deleted_char",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(delete_deleted_char),
    },
    Scenario {
        name: "create_existing_char",
        marker: Marker::NegativeCases,
        setup: &[Hook::CreateSecond],
        teardown: &[Hook::DeleteSecond],
        body: Body::Each(Params::ExistingCharacter, create_existing_char),
    },
    Scenario {
        name: "get_not_existing_char",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(get_not_existing_char),
    },
    Scenario {
        name: "post_wrong_input",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(post_wrong_input),
    },
    Scenario {
        name: "post_only_required_field",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: &[Hook::DeleteOnlyRequired],
        body: Body::Plain(post_only_required_field),
    },
    Scenario {
        name: "post_missing_required_field",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: NO_HOOKS,
        body: Body::Plain(post_missing_required_field),
    },
    Scenario {
        name: "post_min_field_positive",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: &[Hook::ResetDatabase],
        body: Body::Plain(post_min_field_positive),
    },
    Scenario {
        name: "post_max_field_positive",
        marker: Marker::ObjectsApi,
        setup: NO_HOOKS,
        teardown: &[Hook::ResetDatabase],
        body: Body::Plain(post_max_field_positive),
    },
    Scenario {
        name: "post_min_field_negative",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: &[Hook::ResetDatabase],
        body: Body::Plain(post_min_field_negative),
    },
    Scenario {
        name: "post_max_field_negative",
        marker: Marker::NegativeCases,
        setup: NO_HOOKS,
        teardown: &[Hook::ResetDatabase],
        body: Body::Plain(post_max_field_negative),
    },
    Scenario {
        name: "reset_database",
        marker: Marker::HttpFunctional,
        setup: &[Hook::CreateStandard],
        teardown: NO_HOOKS,
        body: Body::Each(Params::StandardCharacter, reset_database),
    },
];

fn name_of(record: &Record) -> &str {
    record_name(record).unwrap_or_default()
}

fn get_character_by_name(ctx: &ScenarioContext<'_>, data: &Record) -> StepResult {
    let resp = ctx.client.get_character_by_name(name_of(data), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Character)?;
    expect_body(ctx.id, &resp, &wrap_result(data.clone()))
}

fn create_character(ctx: &ScenarioContext<'_>, data: &Record) -> StepResult {
    let expected = wrap_result(data.clone());
    let resp = ctx
        .client
        .post_character_by_body(&Value::Object(data.clone()), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_body(ctx.id, &resp, &expected)?;

    let resp = ctx.client.get_character_by_name(name_of(data), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Character)?;
    expect_body(ctx.id, &resp, &expected)
}

fn delete_character_by_name(ctx: &ScenarioContext<'_>, data: &Record) -> StepResult {
    let name = name_of(data);
    let resp = ctx.client.delete_character(name, ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Result)?;
    let deleted = ctx.fixtures.responses.deleted_message(name);
    expect_body(ctx.id, &resp, &wrap_result(deleted))
}

fn headers_field(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx.client.head_characters_page(ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_headers(ctx.id, &resp, &ctx.fixtures.headers)
}

fn update_character_identity_by_name(ctx: &ScenarioContext<'_>, data: &Record) -> StepResult {
    let expected = wrap_result(data.clone());
    let resp = ctx
        .client
        .put_character_by_name(&Value::Object(data.clone()), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_body(ctx.id, &resp, &expected)?;

    let resp = ctx.client.get_character_by_name(name_of(data), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Character)?;
    expect_body(ctx.id, &resp, &expected)
}

fn get_all_characters(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx.client.get_all_characters(ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    let before = resp.count_all_characters();

    let batch = &ctx.fixtures.payloads.many_chars_manipulations;
    let after = count_after_create_chars(ctx.id, ctx.client, ctx.creds, batch)?;
    expect_count(ctx.id, &resp, before + batch.len(), after)?;
    expect_schema(ctx.id, &resp, Contract::Character)
}

fn get_all_duplicate_chars(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx.client.get_all_characters(ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_no_duplicates(ctx.id, &resp)?;
    expect_schema(ctx.id, &resp, Contract::Character)
}

fn characters_field_rules(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx.client.get_all_characters(ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_field_rules(ctx.id, &resp)
}

fn wrong_authorization(ctx: &ScenarioContext<'_>) -> StepResult {
    let creds = ctx
        .creds
        .with_password(ctx.fixtures.payloads.wrong_password.as_str());
    let resp = ctx.client.get_all_characters(&creds)?;
    expect_status(ctx.id, &resp, 401)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.needed_authorization)
}

fn wrong_url_resource(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx.client.get_wrong_url_resource(ctx.creds)?;
    expect_status(ctx.id, &resp, 404)
}

fn empty_login(ctx: &ScenarioContext<'_>) -> StepResult {
    let creds = ctx.creds.with_login("");
    let resp = ctx.client.get_all_characters(&creds)?;
    expect_status(ctx.id, &resp, 500)?;
    expect_raw_text(ctx.id, &resp, &ctx.fixtures.responses.slice_login)
}

fn wrong_order_of_field(ctx: &ScenarioContext<'_>) -> StepResult {
    let payloads = &ctx.fixtures.payloads;
    let resp = ctx.client.post_character_by_body(
        &Value::Object(payloads.wrong_order_of_fields.clone()),
        ctx.creds,
    )?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Character)?;
    expect_body(
        ctx.id,
        &resp,
        &wrap_result(payloads.wrong_order_of_fields_expected.clone()),
    )
}

fn delete_deleted_char(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx
        .client
        .delete_character(&ctx.fixtures.payloads.unknown_name, ctx.creds)?;
    expect_status(ctx.id, &resp, 400)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.no_such_name)
}

fn create_existing_char(ctx: &ScenarioContext<'_>, data: &Record) -> StepResult {
    let resp = ctx
        .client
        .post_character_by_body(&Value::Object(data.clone()), ctx.creds)?;
    expect_status(ctx.id, &resp, 400)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.character_created_already)
}

fn get_not_existing_char(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx
        .client
        .get_character_by_name(&ctx.fixtures.payloads.unknown_name, ctx.creds)?;
    expect_status(ctx.id, &resp, 400)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.no_such_name)
}

/// POST the bare name string instead of an object.
fn post_wrong_input(ctx: &ScenarioContext<'_>) -> StepResult {
    let name = name_of(&ctx.fixtures.payloads.min_length_field);
    let resp = ctx
        .client
        .post_character_by_body(&Value::String(name.to_string()), ctx.creds)?;
    expect_status(ctx.id, &resp, 400)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.invalid_input)
}

fn post_only_required_field(ctx: &ScenarioContext<'_>) -> StepResult {
    let data = &ctx.fixtures.payloads.only_required_name;
    let resp = ctx
        .client
        .post_character_by_body(&Value::Object(data.clone()), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Character)?;
    expect_body(ctx.id, &resp, &wrap_result(data.clone()))
}

fn post_missing_required_field(ctx: &ScenarioContext<'_>) -> StepResult {
    let resp = ctx.client.post_character_by_body(
        &Value::Object(ctx.fixtures.payloads.missing_required_field.clone()),
        ctx.creds,
    )?;
    expect_status(ctx.id, &resp, 400)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.missing_required_field)
}

/// Boundary length the service must accept and echo.
fn post_field_length_accepted(ctx: &ScenarioContext<'_>, n: usize) -> StepResult {
    let payload = make_field_symbols(ctx.fixtures.payloads.min_length_field.clone(), n);
    let resp = ctx
        .client
        .post_character_by_body(&Value::Object(payload.clone()), ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;
    expect_schema(ctx.id, &resp, Contract::Character)?;
    expect_body(ctx.id, &resp, &wrap_result(payload))
}

/// Boundary length the service must reject with the field-length error.
fn post_field_length_rejected(ctx: &ScenarioContext<'_>, n: usize) -> StepResult {
    let payload = make_field_symbols(ctx.fixtures.payloads.min_length_field.clone(), n);
    let resp = ctx
        .client
        .post_character_by_body(&Value::Object(payload), ctx.creds)?;
    expect_status(ctx.id, &resp, 400)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.field_length_error)
}

fn post_min_field_positive(ctx: &ScenarioContext<'_>) -> StepResult {
    post_field_length_accepted(ctx, ACCEPTED_LENGTHS[0])
}

fn post_max_field_positive(ctx: &ScenarioContext<'_>) -> StepResult {
    post_field_length_accepted(ctx, ACCEPTED_LENGTHS[1])
}

fn post_min_field_negative(ctx: &ScenarioContext<'_>) -> StepResult {
    post_field_length_rejected(ctx, REJECTED_LENGTHS[0])
}

fn post_max_field_negative(ctx: &ScenarioContext<'_>) -> StepResult {
    post_field_length_rejected(ctx, REJECTED_LENGTHS[1])
}

fn reset_database(ctx: &ScenarioContext<'_>, data: &Record) -> StepResult {
    let resp = ctx.client.delete_all_characters(ctx.creds)?;
    expect_status(ctx.id, &resp, 200)?;

    let resp = ctx.client.get_character_by_name(name_of(data), ctx.creds)?;
    expect_status(ctx.id, &resp, 400)?;
    expect_schema(ctx.id, &resp, Contract::Error)?;
    expect_body(ctx.id, &resp, &ctx.fixtures.responses.no_such_name)
}
