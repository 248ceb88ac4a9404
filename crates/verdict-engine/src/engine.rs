use std::sync::Arc;

use async_trait::async_trait;
use verdict_rule::{Params, Value};
use verdict_store::{EvalResult, RulesetService, StoreResult};
use verdict_types::Type;

use crate::error::{EngineError, EngineResult};

/// Anything that can resolve and evaluate a ruleset.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate the latest version at `path`.
    async fn eval(&self, path: &str, params: &Params) -> StoreResult<EvalResult>;

    /// Evaluate a specific version at `path`.
    async fn eval_version(
        &self,
        path: &str,
        version: &str,
        params: &Params,
    ) -> StoreResult<EvalResult>;
}

#[async_trait]
impl Evaluator for RulesetService {
    async fn eval(&self, path: &str, params: &Params) -> StoreResult<EvalResult> {
        RulesetService::eval(self, path, params).await
    }

    async fn eval_version(
        &self,
        path: &str,
        version: &str,
        params: &Params,
    ) -> StoreResult<EvalResult> {
        RulesetService::eval_version(self, path, version, params).await
    }
}

/// Typed facade over an [`Evaluator`].
pub struct Engine {
    evaluator: Arc<dyn Evaluator>,
}

impl Engine {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }

    /// Evaluate and return the raw result.
    pub async fn eval(&self, path: &str, params: &Params) -> EngineResult<EvalResult> {
        Ok(self.evaluator.eval(path, params).await?)
    }

    /// Evaluate a specific version and return the raw result.
    pub async fn eval_version(
        &self,
        path: &str,
        version: &str,
        params: &Params,
    ) -> EngineResult<EvalResult> {
        Ok(self.evaluator.eval_version(path, version, params).await?)
    }

    pub async fn get_string(&self, path: &str, params: &Params) -> EngineResult<String> {
        let result = self.evaluator.eval(path, params).await?;
        match result.value {
            Value::String(s) => Ok(s),
            other => Err(mismatch(Type::String, &other)),
        }
    }

    pub async fn get_bool(&self, path: &str, params: &Params) -> EngineResult<bool> {
        let result = self.evaluator.eval(path, params).await?;
        match result.value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(Type::Bool, &other)),
        }
    }

    pub async fn get_int64(&self, path: &str, params: &Params) -> EngineResult<i64> {
        let result = self.evaluator.eval(path, params).await?;
        match result.value {
            Value::Int64(i) => Ok(i),
            other => Err(mismatch(Type::Int64, &other)),
        }
    }

    pub async fn get_float64(&self, path: &str, params: &Params) -> EngineResult<f64> {
        let result = self.evaluator.eval(path, params).await?;
        match result.value {
            Value::Float64(f) => Ok(f),
            other => Err(mismatch(Type::Float64, &other)),
        }
    }
}

fn mismatch(expected: Type, actual: &Value) -> EngineError {
    EngineError::TypeMismatch {
        expected,
        actual: actual.type_of(),
    }
}
