//! Static lookup form served at `/`.

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
	<meta charset="utf-8">
	<title>Entitlement Checker</title>
	<style>
		body { font-family: sans-serif; max-width: 32rem; margin: 3rem auto; }
		label, input, button { display: block; margin-bottom: 0.5rem; }
		input { width: 100%; }
		#results { border: 1px solid #ccc; padding: 0.75rem; min-height: 1.5rem; }
	</style>
</head>
<body>
	<h1>Entitlement Checker</h1>
	<form id="checker" method="GET" action="/ece/getPlans" data-base="{{BASE}}">
		<label for="uid">Email of user <small>(v0.2)</small></label>
		<input type="text" id="uid" name="uid" placeholder="user@example.com">
		<input type="hidden" id="version" name="version" value="0.2">
		<button type="submit">Submit</button>
	</form>
	<div id="results">Results will show here</div>
	<script>
		const form = document.getElementById("checker");
		const results = document.getElementById("results");

		form.addEventListener("submit", async (event) => {
			event.preventDefault();

			const query = new URLSearchParams(new FormData(form));
			const response = await fetch(`${form.dataset.base}/ece/getPlans?${query}`, {
				headers: { Accept: "application/json" },
			});

			if (!response.ok) {
				results.textContent = await response.text();

				return;
			}

			const body = await response.json();

			results.replaceChildren(
				...body.assignedPlans.flatMap((plan) => [
					document.createTextNode(plan.service),
					document.createElement("br"),
				])
			);
		});
	</script>
</body>
</html>
"#;

/// Renders the form with `external_base` prefixed to the lookup URL.
pub(super) fn render_index(external_base: &str) -> String {
	TEMPLATE.replace("{{BASE}}", &escape_attribute(external_base))
}

fn escape_attribute(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			c => escaped.push(c),
		}
	}

	escaped
}
