//! Wire types for the directory's assigned-plans API and the gateway's outward response.

// self
use crate::_prelude::*;

/// Capability status of plans that are surfaced to callers. Matched exactly.
pub const ENABLED: &str = "Enabled";
/// Directory error code reported for unknown users.
pub const RESOURCE_NOT_FOUND: &str = "Request_ResourceNotFound";

/// Single entitlement assignment reported by the directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedPlan {
	/// Assignment timestamp as reported by the directory.
	#[serde(default)]
	pub assigned_date_time: String,
	/// Capability status, e.g. `Enabled`, `Suspended`, `Deleted`.
	#[serde(default)]
	pub capability_status: String,
	/// Service name, e.g. `exchange`.
	#[serde(default)]
	pub service: String,
	/// Service plan identifier.
	#[serde(default)]
	pub service_plan_id: String,
}
impl AssignedPlan {
	/// Returns `true` when the capability status is exactly [`ENABLED`].
	pub fn is_enabled(&self) -> bool {
		self.capability_status == ENABLED
	}
}

/// Successful directory response body: `{"value": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanList {
	/// Plans in directory order.
	#[serde(default)]
	pub value: Vec<AssignedPlan>,
}

/// Outward lookup result: `{"assignedPlans": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedPlans {
	/// Enabled plans in the order the directory returned them.
	pub assigned_plans: Vec<AssignedPlan>,
}
impl AssignedPlans {
	/// Keeps only enabled plans, preserving relative order.
	pub fn enabled(plans: impl IntoIterator<Item = AssignedPlan>) -> Self {
		Self { assigned_plans: plans.into_iter().filter(AssignedPlan::is_enabled).collect() }
	}
}
impl From<PlanList> for AssignedPlans {
	fn from(list: PlanList) -> Self {
		Self::enabled(list.value)
	}
}

/// Failed directory response body: `{"error": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
	/// Error details.
	pub error: DirectoryError,
}

/// Structured directory error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryError {
	/// Machine-readable error code.
	pub code: String,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
	/// Optional diagnostics.
	#[serde(default)]
	pub inner_error: Option<InnerError>,
}

/// Diagnostic fields attached to a directory error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerError {
	/// Directory request identifier.
	#[serde(default, alias = "request-id")]
	pub request_id: Option<String>,
	/// Timestamp of the failure.
	#[serde(default)]
	pub date: Option<String>,
}
