//! Facts observed inside a built image
//!
//! A fact is a named string produced by running a command pipeline in a
//! container started from the image, e.g. the OS version or the version of
//! the packaged application. Facts feed the tag masks.

use crate::error::{SdbError, SdbResult};
use crate::orchestration::Pipeline;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

// Built-in fact definitions embedded at compile time
const BUILTIN_FACTS: &str = include_str!("../../assets/facts.yaml");

fn default_entrypoint() -> bool {
    true
}

/// How to compute one fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactDef {
    /// Fact name referenced by masks as `$name` or `@name`
    pub name: String,

    /// Pipeline arguments, stages separated by `|` or `|&`
    pub args: Vec<String>,

    /// Run the first stage through `/bin/sh -c` instead of the image entrypoint
    #[serde(default = "default_entrypoint")]
    pub entrypoint: bool,
}

/// Parse the built-in fact definitions
pub fn builtin_facts() -> SdbResult<Vec<FactDef>> {
    Ok(serde_yaml::from_str(BUILTIN_FACTS)?)
}

/// Fact definitions to gather: built-ins first (if enabled), then `own`.
///
/// Later definitions win on name clashes since they are applied last.
pub fn fact_defs(own: &[FactDef], include_builtin: bool) -> SdbResult<Vec<FactDef>> {
    let mut defs = if include_builtin {
        builtin_facts()?
    } else {
        Vec::new()
    };
    defs.extend(own.iter().cloned());
    Ok(defs)
}

/// Fact name to value mapping.
///
/// Tables are never mutated in place: [`FactTable::with`] consumes the
/// table and returns the extended one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactTable(BTreeMap<String, String>);

impl FactTable {
    /// Table with `name` set to `value`
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut facts = self.0;
        facts.insert(name.into(), value.into());
        Self(facts)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Facts in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FactTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |table, (k, v)| table.with(k, v))
    }
}

/// Something that can compute a fact value
#[async_trait]
pub trait FactSource: Send + Sync {
    async fn compute(&self, def: &FactDef) -> SdbResult<String>;
}

/// Computes facts by running pipelines against a container image
pub struct ContainerFacts {
    engine: String,
    image: String,
    timeout: Option<Duration>,
}

impl ContainerFacts {
    pub fn new(engine: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            image: image.into(),
            timeout: None,
        }
    }

    /// Abort any single fact that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl FactSource for ContainerFacts {
    async fn compute(&self, def: &FactDef) -> SdbResult<String> {
        let pipeline = Pipeline::build(&self.engine, def.entrypoint, &self.image, &def.args);
        debug!("Fact {}: {}", def.name, pipeline.describe());

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pipeline.run())
                .await
                .map_err(|_| SdbError::FactTimeout {
                    name: def.name.clone(),
                    secs: limit.as_secs(),
                })?,
            None => pipeline.run().await,
        }
    }
}

/// Outcome of gathering a list of facts
#[derive(Debug, Default)]
pub struct Gathered {
    pub facts: FactTable,
    pub failures: Vec<(String, SdbError)>,
}

impl Gathered {
    fn record(self, name: &str, result: SdbResult<String>) -> Self {
        match result {
            Ok(value) => {
                info!("Fact {} = {}", name, value);
                Self {
                    facts: self.facts.with(name, value),
                    failures: self.failures,
                }
            }
            Err(e) => {
                warn!("Fact {} failed: {}", name, e);
                let mut failures = self.failures;
                failures.push((name.to_string(), e));
                Self {
                    facts: self.facts,
                    failures,
                }
            }
        }
    }
}

/// Compute `defs` one after another.
///
/// A failing fact is recorded and left out of the table; the remaining
/// facts are still gathered.
pub async fn gather_facts(defs: &[FactDef], source: &dyn FactSource) -> Gathered {
    stream::iter(defs)
        .fold(Gathered::default(), |gathered, def| async move {
            let result = source.compute(def).await;
            gathered.record(&def.name, result)
        })
        .await
}
