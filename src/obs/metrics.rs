// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"native_auth_bridge_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a classified page-load failure (when enabled).
pub fn record_load_failure(category: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("native_auth_bridge_load_failure_total", "category" => category)
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = category;
	}
}
