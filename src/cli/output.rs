//! Output formatting for CLI

use crate::policy::Policy;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Format a slice of numbers as `[a, b, c]` with fixed precision
pub fn format_values(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

/// Print one row per agent and situation with the action probabilities
pub fn print_policy(policy: &Policy, situation_labels: &[String], action_labels: &[String]) {
    let header: Vec<String> = action_labels.iter().map(|a| format!("{a:>10}")).collect();
    println!("  {:8} {:12} {}", "agent", "situation", header.join(""));
    for (agent, rows) in policy.values().outer_iter().enumerate() {
        for (situation, row) in rows.outer_iter().enumerate() {
            let label = situation_labels
                .get(situation)
                .cloned()
                .unwrap_or_else(|| situation.to_string());
            let probabilities: Vec<String> = row.iter().map(|p| format!("{p:>10.4}")).collect();
            println!("  {agent:<8} {label:12} {}", probabilities.join(""));
        }
    }
}
