// self
use crate::obs::{OpKind, OpOutcome};

/// Bumps `entitlement_gateway_op_total` for `kind` and `outcome`. Without the `metrics`
/// feature this compiles to nothing.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"entitlement_gateway_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn lookup_and_refresh_outcomes_record_without_an_installed_recorder() {
		for kind in [OpKind::CredentialRefresh, OpKind::Lookup] {
			for outcome in [OpOutcome::Attempt, OpOutcome::Success, OpOutcome::Failure] {
				record_op_outcome(kind, outcome);
			}
		}
	}
}
