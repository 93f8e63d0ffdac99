//! Sequential suite runner
//!
//! Runs the selected cases in catalogue order, one at a time. Teardown runs
//! whether or not the body passed.

use std::time::Instant;

use charsuite_core::{
    Config, Credentials, Fixtures, Marker, OutcomeStatus, ScenarioOutcome, SuiteReport,
};

use crate::assertions::{StepError, StepResult};
use crate::client::{ApiClient, ClientError};
use crate::scenarios::{ScenarioCase, ScenarioContext, select};

pub struct SuiteRunner {
    client: ApiClient,
    creds: Credentials,
    fixtures: Fixtures,
    markers: Vec<Marker>,
    filter: Option<String>,
    /// Stop after the first case that does not pass
    fail_fast: bool,
}

impl SuiteRunner {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, fixtures: Fixtures) -> Result<Self, ClientError> {
        Ok(Self {
            client: ApiClient::from_config(config)?,
            creds: config.credentials(),
            fixtures,
            markers: Vec::new(),
            filter: None,
            fail_fast: false,
        })
    }

    #[must_use]
    pub fn with_markers(mut self, markers: Vec<Marker>) -> Self {
        self.markers = markers;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Case ids and markers that `run` would execute.
    #[must_use]
    pub fn plan(&self) -> Vec<(String, Marker)> {
        self.cases()
            .into_iter()
            .map(|case| {
                let marker = case.marker();
                (case.id, marker)
            })
            .collect()
    }

    #[must_use]
    pub fn run(&self) -> SuiteReport {
        let cases = self.cases();
        tracing::info!(
            cases = cases.len(),
            base_url = self.client.base_url(),
            "running suite"
        );

        let mut outcomes = Vec::with_capacity(cases.len());
        for case in &cases {
            let outcome = self.run_case(case);
            let stop = self.fail_fast && outcome.status != OutcomeStatus::Passed;
            outcomes.push(outcome);
            if stop {
                tracing::warn!(
                    skipped = cases.len() - outcomes.len(),
                    "stopped early: scenario did not pass (--fail-fast)"
                );
                break;
            }
        }
        SuiteReport::from_outcomes(outcomes)
    }

    fn cases(&self) -> Vec<ScenarioCase<'_>> {
        select(&self.fixtures, &self.markers, self.filter.as_deref())
    }

    fn run_case(&self, case: &ScenarioCase<'_>) -> ScenarioOutcome {
        let ctx = ScenarioContext {
            id: &case.id,
            client: &self.client,
            creds: &self.creds,
            fixtures: &self.fixtures,
        };
        let start = Instant::now();

        let mut result: StepResult = case
            .scenario
            .setup
            .iter()
            .try_for_each(|hook| hook.apply(&ctx));
        if result.is_ok() {
            result = case.run(&ctx);
        }

        for hook in case.scenario.teardown {
            if let Err(err) = hook.apply(&ctx) {
                tracing::warn!(scenario = %case.id, hook = ?hook, error = %err, "teardown failed");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (status, failures, error) = match result {
            Ok(()) => (OutcomeStatus::Passed, Vec::new(), None),
            Err(StepError::Failed(failure)) => (OutcomeStatus::Failed, vec![*failure], None),
            Err(StepError::Transport(err)) => {
                (OutcomeStatus::Errored, Vec::new(), Some(err.to_string()))
            }
        };

        match status {
            OutcomeStatus::Passed => {
                tracing::info!(scenario = %case.id, marker = %case.marker(), duration_ms, "passed");
            }
            OutcomeStatus::Failed => {
                let reason = failures
                    .first()
                    .and_then(|f| f.message())
                    .unwrap_or_default();
                tracing::info!(scenario = %case.id, marker = %case.marker(), duration_ms, reason, "failed");
            }
            OutcomeStatus::Errored => {
                tracing::info!(
                    scenario = %case.id,
                    marker = %case.marker(),
                    duration_ms,
                    error = error.as_deref().unwrap_or_default(),
                    "errored"
                );
            }
        }

        ScenarioOutcome {
            id: case.id.clone(),
            marker: case.marker(),
            status,
            duration_ms,
            failures,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> SuiteRunner {
        let config = Config {
            base_url: "http://127.0.0.1:9/v2".into(),
            ..Config::default()
        };
        SuiteRunner::from_config(&config, Fixtures::embedded().clone()).unwrap()
    }

    #[test]
    fn plan_honours_filters() {
        let plan = runner()
            .with_markers(vec![Marker::ObjectsApi])
            .with_filter(Some("dup".into()))
            .plan();
        assert_eq!(
            plan,
            vec![("get_all_duplicate_chars".to_string(), Marker::ObjectsApi)]
        );
    }

    #[test]
    fn unreachable_service_errors_each_case() {
        let report = runner()
            .with_filter(Some("wrong_url_resource".into()))
            .run();
        assert_eq!(report.total, 1);
        assert_eq!(report.errored, 1);
        assert!(report.scenarios[0].error.is_some());
        assert!(report.failures().is_empty());
    }

    #[test]
    fn fail_fast_stops_after_first_error() {
        let report = runner()
            .with_markers(vec![Marker::NegativeCases])
            .with_fail_fast(true)
            .run();
        assert_eq!(report.total, 1);
        assert_eq!(report.errored, 1);
    }
}
