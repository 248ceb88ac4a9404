//! Evaluation adapter: resolve a ruleset, evaluate it, report the version.

use verdict_rule::Params;

use crate::error::{StoreError, StoreResult};
use crate::service::RulesetService;
use crate::types::EvalResult;

/// `NotFound` from the readers becomes the eval-specific error so callers
/// can tell "no such ruleset" from "evaluation failed".
fn translate_not_found(err: StoreError) -> StoreError {
    match err {
        StoreError::NotFound => StoreError::RulesetNotFound,
        other => other,
    }
}

impl RulesetService {
    /// Evaluate the latest version of the ruleset at `path`.
    pub async fn eval(&self, path: &str, params: &Params) -> StoreResult<EvalResult> {
        let entry = self.latest(path).await.map_err(translate_not_found)?;
        let value = entry.ruleset.eval(params)?;
        Ok(EvalResult {
            value,
            version: entry.version,
        })
    }

    /// Evaluate a specific version of the ruleset at `path`.
    pub async fn eval_version(
        &self,
        path: &str,
        version: &str,
        params: &Params,
    ) -> StoreResult<EvalResult> {
        let entry = self
            .one_by_version(path, version)
            .await
            .map_err(translate_not_found)?;
        let value = entry.ruleset.eval(params)?;
        Ok(EvalResult {
            value,
            version: entry.version,
        })
    }
}
