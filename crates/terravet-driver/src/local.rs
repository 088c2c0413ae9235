use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DriverError;
use crate::provisioner::{ApplyOutputs, OutputValue, Provisioner};

/// A scripted stub provisioner. Performs no I/O; records the verb
/// sequence and returns canned results, so the harness's orchestration
/// (ordering, guaranteed destroy, panic containment) can be exercised
/// without a binary or a cloud.
#[derive(Debug, Default)]
pub struct LocalProvisioner {
    fail_init: bool,
    fail_plan: bool,
    fail_apply: bool,
    fail_destroy: bool,
    outputs: Mutex<ApplyOutputs>,
    calls: Mutex<Vec<&'static str>>,
}

impl LocalProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub the outputs a successful apply would declare.
    pub fn with_outputs(self, values: BTreeMap<String, OutputValue>) -> Self {
        {
            let mut outputs = self.outputs.lock().expect("outputs lock");
            for (k, v) in values {
                outputs.insert(k, v);
            }
        }
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_plan(mut self) -> Self {
        self.fail_plan = true;
        self
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    /// Verbs invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn destroy_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == "destroy").count()
    }

    fn record(&self, verb: &'static str) {
        debug!(verb, "LocalProvisioner");
        self.calls.lock().expect("calls lock").push(verb);
    }
}

#[async_trait]
impl Provisioner for LocalProvisioner {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn init(&self) -> Result<(), DriverError> {
        self.record("init");
        if self.fail_init {
            return Err(DriverError::CommandFailed {
                verb: "init",
                code: 1,
                log: "Error: failed to install provider".into(),
            });
        }
        Ok(())
    }

    async fn validate(&self) -> Result<(), DriverError> {
        self.record("validate");
        Ok(())
    }

    async fn plan(&self) -> Result<(), DriverError> {
        self.record("plan");
        if self.fail_plan {
            return Err(DriverError::CommandFailed {
                verb: "plan",
                code: 1,
                log: "Error: vnet_address_space must contain at least one CIDR".into(),
            });
        }
        Ok(())
    }

    async fn apply(&self) -> Result<(), DriverError> {
        self.record("apply");
        if self.fail_apply {
            return Err(DriverError::CommandFailed {
                verb: "apply",
                code: 1,
                log: "Error: provisioning rejected".into(),
            });
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), DriverError> {
        self.record("destroy");
        if self.fail_destroy {
            return Err(DriverError::CommandFailed {
                verb: "destroy",
                code: 1,
                log: "Error: deletion blocked".into(),
            });
        }
        Ok(())
    }

    async fn outputs(&self) -> Result<ApplyOutputs, DriverError> {
        self.record("output");
        Ok(self.outputs.lock().expect("outputs lock").clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_the_verb_sequence() {
        let p = LocalProvisioner::new();
        p.init().await.unwrap();
        p.apply().await.unwrap();
        p.destroy().await.unwrap();
        assert_eq!(p.calls(), vec!["init", "apply", "destroy"]);
        assert_eq!(p.destroy_count(), 1);
    }

    #[tokio::test]
    async fn scripted_plan_failure_carries_raw_log() {
        let p = LocalProvisioner::new().failing_plan();
        let err = p.plan().await.unwrap_err();
        match err {
            DriverError::CommandFailed { verb: "plan", log, .. } => {
                assert!(log.contains("at least one CIDR"));
            }
            other => panic!("expected plan CommandFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn stubbed_outputs_round_trip() {
        let p = LocalProvisioner::new().with_outputs(BTreeMap::from([(
            "vnet_id".to_string(),
            OutputValue::Scalar("local://vnet".into()),
        )]));
        p.apply().await.unwrap();
        let outputs = p.outputs().await.unwrap();
        assert_eq!(outputs.scalar("vnet_id").unwrap(), "local://vnet");
    }
}
