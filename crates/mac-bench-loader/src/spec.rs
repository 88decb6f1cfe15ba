use anyhow::{Context, Result};
use mac_bench_abstract::SchedPolicy;

/// Parse a comma-separated policy list such as `time_rr,time_pf`.
pub fn parse_policy_list(spec: &str) -> Result<Vec<SchedPolicy>> {
    let policies = spec
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(builtin_by_name)
        .collect::<Result<Vec<_>>>()?;
    if policies.is_empty() {
        anyhow::bail!("Policy list '{spec}' is empty");
    }
    Ok(policies)
}

/// Map a user-visible policy name to the policy the built-in scheduler runs.
pub fn builtin_by_name(name: &str) -> Result<SchedPolicy> {
    name.parse::<SchedPolicy>()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid policy name '{name}'"))
}
