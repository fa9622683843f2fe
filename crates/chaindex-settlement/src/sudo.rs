//! Privileged ("sudo") contract calls.

use std::time::{Duration, Instant};

use chaindex_telemetry::{Telemetry, metrics, report_if_exceeded};
use chaindex_types::{BlockContext, ContractAddress, Result, SudoMsg, SudoResponse};

/// The contract runtime, as seen by end-block logic.
///
/// Calls are synchronous and run to completion. `gas_limit` caps what the
/// contract may consume.
pub trait ContractCaller: Send + Sync {
    fn call_sudo(
        &self,
        ctx: &BlockContext,
        contract: &ContractAddress,
        msg: &SudoMsg,
        gas_limit: u64,
    ) -> Result<SudoResponse>;
}

/// Call `contract` with `msg`, recording duration under the message type
/// and counting failures. A call slower than `not_done_after` is reported
/// but never interrupted.
pub fn call_contract_sudo(
    caller: &dyn ContractCaller,
    telemetry: &dyn Telemetry,
    ctx: &BlockContext,
    contract: &ContractAddress,
    msg: &SudoMsg,
    gas_limit: u64,
    not_done_after: Duration,
) -> Result<SudoResponse> {
    let msg_type = msg.msg_type();
    let start = Instant::now();
    let result = caller.call_sudo(ctx, contract, msg, gas_limit);
    metrics::measure_sudo_execution_duration(telemetry, start, msg_type);
    report_if_exceeded(telemetry, &format!("sudo_{msg_type}"), start, not_done_after);

    match &result {
        Ok(response) => {
            tracing::debug!(%contract, msg_type, gas_limit, gas_used = response.gas_used, "Sudo call succeeded");
        }
        Err(_) => metrics::increment_sudo_fail_count(telemetry, msg_type),
    }
    result
}

/// Scriptable [`ContractCaller`] for tests.
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock {
    use std::collections::BTreeSet;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use chaindex_types::{
        BlockContext, ChaindexError, ContractAddress, Result, SudoMsg, SudoResponse,
    };

    use super::ContractCaller;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedCall {
        pub height: u64,
        pub contract: ContractAddress,
        pub msg: SudoMsg,
        pub gas_limit: u64,
    }

    #[derive(Debug, Default)]
    pub struct MockCaller {
        calls: Mutex<Vec<RecordedCall>>,
        failing: Mutex<BTreeSet<ContractAddress>>,
        delay: Option<Duration>,
    }

    impl MockCaller {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every call sleeps this long before answering.
        #[must_use]
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Make calls to `contract` fail.
        pub fn fail_for(&self, contract: &ContractAddress) {
            self.failing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(contract.clone());
        }

        #[must_use]
        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
        }
    }

    impl ContractCaller for MockCaller {
        fn call_sudo(
            &self,
            ctx: &BlockContext,
            contract: &ContractAddress,
            msg: &SudoMsg,
            gas_limit: u64,
        ) -> Result<SudoResponse> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedCall {
                    height: ctx.height,
                    contract: contract.clone(),
                    msg: msg.clone(),
                    gas_limit,
                });
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if self
                .failing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(contract)
            {
                return Err(ChaindexError::ContractCall {
                    contract: contract.clone(),
                    reason: "execution reverted".into(),
                });
            }
            Ok(SudoResponse {
                gas_used: gas_limit / 2,
                data: Vec::new(),
            })
        }
    }
}
